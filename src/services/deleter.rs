//! Cascading record deletion

use crate::{
    error::{AppError, AppResult},
    repository::records::RecordWriter,
};

/// Rows removed by a record deletion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub subfields: u64,
    pub data_fields: u64,
    pub control_fields: u64,
    pub holdings: u64,
}

/// Delete a record and everything that references it.
///
/// Children go first so no step leaves a dangling reference: subfields, data
/// fields, control fields, holdings, then the record row. The caller owns the
/// transaction; any failure leaves it to be rolled back.
pub async fn delete_record_graph<W: RecordWriter + ?Sized>(
    tx: &mut W,
    record_id: i32,
) -> AppResult<DeletionReport> {
    if tx.lock_record(record_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Record {} not found", record_id)));
    }

    let report = DeletionReport {
        subfields: tx.delete_record_subfields(record_id).await?,
        data_fields: tx.delete_record_data_fields(record_id).await?,
        control_fields: tx.delete_record_control_fields(record_id).await?,
        holdings: tx.delete_record_holdings(record_id).await?,
    };

    if tx.delete_record(record_id).await? == 0 {
        return Err(AppError::NotFound(format!("Record {} not found", record_id)));
    }

    tracing::debug!("Deleted record {} ({:?})", record_id, report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marc::UnimarcDocument;
    use crate::repository::records::{MockRecordWriter, NewControlField, NewDataField, NewSubfield};
    use crate::services::testing::MemoryStore;
    use mockall::Sequence;

    #[tokio::test]
    async fn test_children_deleted_before_record() {
        let mut seq = Sequence::new();
        let mut writer = MockRecordWriter::new();
        writer
            .expect_lock_record()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(UnimarcDocument::default())));
        writer
            .expect_delete_record_subfields()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(6));
        writer
            .expect_delete_record_data_fields()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(3));
        writer
            .expect_delete_record_control_fields()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(2));
        writer
            .expect_delete_record_holdings()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(1));
        writer
            .expect_delete_record()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(1));

        let report = delete_record_graph(&mut writer, 7).await.unwrap();
        assert_eq!(
            report,
            DeletionReport {
                subfields: 6,
                data_fields: 3,
                control_fields: 2,
                holdings: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_missing_record_writes_nothing() {
        let mut writer = MockRecordWriter::new();
        writer.expect_lock_record().returning(|_| Ok(None));
        writer.expect_delete_record_subfields().never();
        writer.expect_delete_record().never();

        let err = delete_record_graph(&mut writer, 7).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failure_stops_the_cascade() {
        let mut writer = MockRecordWriter::new();
        writer
            .expect_lock_record()
            .returning(|_| Ok(Some(UnimarcDocument::default())));
        writer.expect_delete_record_subfields().returning(|_| Ok(0));
        writer
            .expect_delete_record_data_fields()
            .returning(|_| Err(AppError::Internal("connection lost".to_string())));
        writer.expect_delete_record_control_fields().never();
        writer.expect_delete_record_holdings().never();
        writer.expect_delete_record().never();

        assert!(delete_record_graph(&mut writer, 7).await.is_err());
    }

    #[tokio::test]
    async fn test_full_graph_is_removed() {
        let mut store = MemoryStore::new();
        let record_id = store.insert_record(&UnimarcDocument::default()).await.unwrap();
        let other_id = store.insert_record(&UnimarcDocument::default()).await.unwrap();

        for position in 0..2 {
            store
                .insert_control_field(
                    record_id,
                    &NewControlField {
                        definition_id: 1,
                        value: "x".to_string(),
                        position,
                    },
                )
                .await
                .unwrap();
        }
        for position in 0..3 {
            store
                .insert_data_field(
                    record_id,
                    &NewDataField {
                        definition_id: 10,
                        ind1: String::new(),
                        ind2: String::new(),
                        position,
                        subfields: (0..4)
                            .map(|i| NewSubfield {
                                value: format!("v{}", i),
                                position: i,
                            })
                            .collect(),
                    },
                )
                .await
                .unwrap();
        }
        store
            .insert_data_field(
                other_id,
                &NewDataField {
                    definition_id: 10,
                    ind1: String::new(),
                    ind2: String::new(),
                    position: 0,
                    subfields: vec![NewSubfield {
                        value: "kept".to_string(),
                        position: 0,
                    }],
                },
            )
            .await
            .unwrap();
        store.add_holding(record_id);

        let report = delete_record_graph(&mut store, record_id).await.unwrap();
        assert_eq!(report.subfields, 12);
        assert_eq!(report.data_fields, 3);
        assert_eq!(report.control_fields, 2);
        assert_eq!(report.holdings, 1);

        assert!(store.metadata(record_id).is_none());
        assert!(store.control_fields.is_empty());
        assert_eq!(store.data_fields.len(), 1);
        assert_eq!(store.subfields.len(), 1);
        assert!(store.metadata(other_id).is_some());
    }
}

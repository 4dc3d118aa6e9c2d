use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::Result;

/// Encodes `batch` as a complete Parquet file in memory.
///
/// Writer properties are fixed and carry no wall-clock data, so identical
/// batches always encode to identical bytes.
pub fn encode_parquet(batch: &RecordBatch) -> Result<Vec<u8>> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_created_by(concat!("trip_etl ", env!("CARGO_PKG_VERSION")).to_string())
        .build();

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::PeakCongestionRow;
    use crate::sink::batch::ToRecordBatch;
    use arrow::array::{AsArray, Int64Array};
    use bytes::Bytes;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    fn sample_batch() -> RecordBatch {
        PeakCongestionRow::to_record_batch(&[
            PeakCongestionRow { is_peak: false, trip_count: 4, avg_trip_distance: Some(1.5) },
            PeakCongestionRow { is_peak: true, trip_count: 0, avg_trip_distance: None },
        ])
        .unwrap()
    }

    #[test]
    fn test_encoded_file_reads_back() {
        let bytes = encode_parquet(&sample_batch()).unwrap();
        assert_eq!(&bytes[..4], b"PAR1");

        let reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(bytes))
            .unwrap()
            .build()
            .unwrap();
        let batches: Vec<RecordBatch> = reader.map(|b| b.unwrap()).collect();

        assert_eq!(batches.len(), 1);
        let counts = batches[0]
            .column_by_name("trip_count")
            .unwrap()
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(counts.value(0), 4);
        assert_eq!(counts.value(1), 0);
        assert!(!batches[0].column(0).as_boolean().value(0));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let batch = sample_batch();
        assert_eq!(encode_parquet(&batch).unwrap(), encode_parquet(&batch).unwrap());
    }
}

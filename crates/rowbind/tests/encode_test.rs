//! Integration tests for encoding records into rows

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use pretty_assertions::assert_eq;
use rowbind::{
    Category, ConversionError, DelimitedWriter, DescriptorCache, Encoder, Error, FieldMeta,
    Record, RowWriter,
};
use std::any::Any;
use std::sync::Arc;

const FORMAT_ROW: &str = "str,-1,-32,-64,32,64,3.2,6.4,2017-12-24T15:30:00\n";

#[derive(Debug, Default, Record)]
struct Sample {
    #[csv("0,str")]
    text: String,
    #[csv("1,int")]
    int: i64,
    #[csv("2,int32")]
    int32: i32,
    #[csv("3,int64")]
    int64: i64,
    #[csv("4,uint32")]
    uint32: u32,
    #[csv("5,uint64")]
    uint64: u64,
    #[csv("6,float32")]
    float32: f32,
    #[csv("7,float64")]
    float64: f64,
    #[csv("8,time,%Y-%m-%dT%H:%M:%S")]
    time: DateTime<Utc>,
}

#[derive(Debug, Default, Record)]
struct OptionalSample {
    #[csv("0,str")]
    text: Option<String>,
    #[csv("1,int")]
    int: Option<i64>,
    #[csv("2,int32")]
    int32: Option<i32>,
    #[csv("3,int64")]
    int64: Option<i64>,
    #[csv("4,uint32")]
    uint32: Option<u32>,
    #[csv("5,uint64")]
    uint64: Option<u64>,
    #[csv("6,float32")]
    float32: Option<f32>,
    #[csv("7,float64")]
    float64: Option<f64>,
    #[csv("8,time,%Y-%m-%dT%H:%M:%S")]
    time: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Record)]
struct Account {
    #[csv("0,id")]
    id: i64,
    #[csv("1,name")]
    name: String,
    #[csv("2,created,%Y-%m-%dT%H:%M:%S")]
    created: DateTime<Utc>,
}

fn sample(timestamp: i64) -> Sample {
    Sample {
        text: "str".to_string(),
        int: -1,
        int32: -32,
        int64: -64,
        uint32: 32,
        uint64: 64,
        float32: 3.2,
        float64: 6.4,
        time: DateTime::from_timestamp(timestamp, 0).unwrap(),
    }
}

fn text_encoder() -> Encoder<DelimitedWriter<Vec<u8>>> {
    Encoder::new(DelimitedWriter::new(Vec::new())).with_cache(Arc::new(DescriptorCache::new()))
}

fn finish(encoder: Encoder<DelimitedWriter<Vec<u8>>>) -> String {
    let bytes = encoder.into_inner().into_inner().unwrap();
    String::from_utf8(bytes).unwrap()
}

#[test]
fn test_encode_all_categories() {
    let mut encoder = text_encoder();
    encoder.encode_one(&sample(1_514_129_400)).unwrap();
    encoder.flush().unwrap();
    assert_eq!(finish(encoder), FORMAT_ROW);
}

#[test]
fn test_encode_in_configured_zone() {
    let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
    let mut encoder = text_encoder().with_zone(tokyo);
    encoder.encode_one(&sample(1_514_097_000)).unwrap();
    assert_eq!(finish(encoder), FORMAT_ROW);
}

#[test]
fn test_absent_optionals_encode_empty() {
    let mut encoder = text_encoder();
    encoder.encode_one(&OptionalSample::default()).unwrap();
    encoder
        .encode_one(&OptionalSample {
            text: Some("str".to_string()),
            int32: Some(-32),
            time: DateTime::from_timestamp(1_514_129_400, 0),
            ..OptionalSample::default()
        })
        .unwrap();

    assert_eq!(
        finish(encoder),
        ",,,,,,,,\nstr,,-32,,,,,,2017-12-24T15:30:00\n"
    );
}

#[test]
fn test_header_and_records() {
    let mut encoder = text_encoder();
    encoder.write_header::<Account>().unwrap();
    encoder
        .encode_one(&Account {
            id: 1,
            name: "Alice".to_string(),
            created: DateTime::from_timestamp(1_514_129_400, 0).unwrap(),
        })
        .unwrap();

    assert_eq!(
        finish(encoder),
        "id,name,created\n1,Alice,2017-12-24T15:30:00\n"
    );
}

#[test]
fn test_hook_replaces_zero_times() {
    let hook = |meta: &FieldMeta, value: &dyn Any| -> Result<Option<String>, ConversionError> {
        if meta.category() != Category::Temporal {
            return Ok(None);
        }
        match value.downcast_ref::<DateTime<Utc>>() {
            Some(time) if *time == DateTime::<Utc>::default() => Ok(Some("N/A".to_string())),
            _ => Ok(None),
        }
    };

    let mut encoder = text_encoder().with_hook(hook);
    encoder
        .encode_one(&Account {
            id: 1,
            name: "Alice".to_string(),
            created: DateTime::from_timestamp(1_514_129_400, 0).unwrap(),
        })
        .unwrap();
    encoder
        .encode_one(&Account {
            id: 2,
            name: "Bob".to_string(),
            created: DateTime::default(),
        })
        .unwrap();

    assert_eq!(
        finish(encoder),
        "1,Alice,2017-12-24T15:30:00\n2,Bob,N/A\n"
    );
}

#[test]
fn test_failed_record_writes_nothing() {
    #[derive(Debug, Default, Record)]
    struct Stamped {
        #[csv("0,id")]
        id: u32,
        #[csv("1,day,%Y-%m-%d %z")]
        day: NaiveDate,
    }

    let mut encoder = Encoder::new(Vec::<Vec<String>>::new())
        .with_cache(Arc::new(DescriptorCache::new()))
        .with_hook(|meta: &FieldMeta, _: &dyn Any| {
            if meta.field_name() == "day" {
                Err(ConversionError::custom("day is not renderable"))
            } else {
                Ok(None)
            }
        });

    let err = encoder.encode_one(&Stamped::default()).unwrap_err();
    assert!(matches!(err, Error::Encode { ref field, .. } if field == "day"));
    assert_eq!(
        err.to_string(),
        "Field day encode failed: day is not renderable"
    );
    assert!(encoder.get_ref().is_empty());
}

#[test]
fn test_borrowed_writer() {
    let mut rows: Vec<Vec<String>> = Vec::new();
    {
        let mut encoder = Encoder::new(&mut rows).with_cache(Arc::new(DescriptorCache::new()));
        encoder.encode_one(&Account::default()).unwrap();
        encoder.get_mut().flush().unwrap();
    }
    assert_eq!(rows, vec![vec!["0", "", "1970-01-01T00:00:00"]]);
}

//! Dates, times, timestamps (including legacy INT96) and intervals.

use bytes::{BufMut, BytesMut};
use jiff::civil::{Date, Time};
use jiff::tz::TimeZone;
use jiff::Timestamp;
use std::cmp::Ordering;

use super::{read_fixed, source_range, ArrayPool, DataCodec, PoolSet};
use crate::buffer::ReadCursor;
use crate::metadata::{ColumnAnnotation, SchemaElement, TimeUnit, Type};
use crate::options::FormatOptions;
use crate::value::Interval;
use crate::{ParquetError, Result};

/// Julian day of 1970-01-01
const UNIX_EPOCH_JULIAN: i64 = 2_440_588;

const SECONDS_PER_DAY: i64 = 86_400;
const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_DAY: i64 = SECONDS_PER_DAY * NANOS_PER_SECOND;

fn jiff_err(context: &str, err: jiff::Error) -> ParquetError {
    ParquetError::conversion(format!("{}: {}", context, err))
}

/// Legacy INT96 timestamps.
///
/// - First 8 bytes: nanoseconds since midnight
/// - Next 4 bytes: Julian day
#[derive(Debug)]
pub struct Int96Codec {
    pool: ArrayPool<Timestamp>,
}

impl Int96Codec {
    pub fn new(pools: &PoolSet) -> Self {
        Self {
            pool: pools.timestamp.clone(),
        }
    }
}

fn int96_to_timestamp(bytes: [u8; 12]) -> Result<Timestamp> {
    let mut nanos = [0u8; 8];
    nanos.copy_from_slice(&bytes[..8]);
    let mut julian = [0u8; 4];
    julian.copy_from_slice(&bytes[8..]);

    let nanos_of_day = i64::from_le_bytes(nanos) as i128;
    let days = i64::from(i32::from_le_bytes(julian)) - UNIX_EPOCH_JULIAN;
    let total = i128::from(days) * i128::from(NANOS_PER_DAY) + nanos_of_day;
    Timestamp::from_nanosecond(total).map_err(|e| jiff_err("INT96 timestamp out of range", e))
}

fn timestamp_to_int96(ts: &Timestamp, out: &mut BytesMut) -> Result<()> {
    let total = ts.as_nanosecond();
    let days = total.div_euclid(i128::from(NANOS_PER_DAY));
    let nanos_of_day = total.rem_euclid(i128::from(NANOS_PER_DAY)) as i64;
    let julian = i32::try_from(days + i128::from(UNIX_EPOCH_JULIAN)).map_err(|_| {
        ParquetError::conversion(format!("timestamp {} does not fit INT96", ts))
    })?;
    out.put_i64_le(nanos_of_day);
    out.put_i32_le(julian);
    Ok(())
}

impl DataCodec for Int96Codec {
    type Value = Timestamp;

    fn is_match(element: &SchemaElement, _options: &FormatOptions) -> bool {
        element.physical_type == Some(Type::INT96)
    }

    fn name(&self) -> &'static str {
        "Int96"
    }

    fn pool(&self) -> &ArrayPool<Timestamp> {
        &self.pool
    }

    fn filler(&self) -> Timestamp {
        Timestamp::UNIX_EPOCH
    }

    fn read(
        &self,
        cursor: &mut ReadCursor,
        _element: &SchemaElement,
        dest: &mut [Timestamp],
        offset: usize,
    ) -> Result<usize> {
        read_fixed(cursor, dest, offset, int96_to_timestamp)
    }

    fn write(
        &self,
        out: &mut BytesMut,
        _element: &SchemaElement,
        source: &[Timestamp],
        offset: usize,
        count: usize,
    ) -> Result<()> {
        for ts in source_range(source, offset, count)? {
            timestamp_to_int96(ts, out)?;
        }
        Ok(())
    }

    fn compare(&self, a: &Timestamp, b: &Timestamp) -> Ordering {
        a.cmp(b)
    }
}

/// Days since the Unix epoch stored as INT32.
#[derive(Debug)]
pub struct DateCodec {
    pool: ArrayPool<Date>,
}

impl DateCodec {
    pub fn new(pools: &PoolSet) -> Self {
        Self {
            pool: pools.date.clone(),
        }
    }
}

fn days_to_date(days: i32) -> Result<Date> {
    let ts = Timestamp::from_second(i64::from(days) * SECONDS_PER_DAY)
        .map_err(|e| jiff_err("date out of range", e))?;
    Ok(ts.to_zoned(TimeZone::UTC).date())
}

fn date_to_days(date: &Date) -> Result<i32> {
    let zoned = date
        .to_zoned(TimeZone::UTC)
        .map_err(|e| jiff_err("date out of range", e))?;
    let days = zoned.timestamp().as_second().div_euclid(SECONDS_PER_DAY);
    i32::try_from(days).map_err(|_| ParquetError::conversion(format!("date {} does not fit INT32", date)))
}

impl DataCodec for DateCodec {
    type Value = Date;

    fn is_match(element: &SchemaElement, _options: &FormatOptions) -> bool {
        element.physical_type == Some(Type::INT32) && element.annotation() == Some(ColumnAnnotation::Date)
    }

    fn name(&self) -> &'static str {
        "Date"
    }

    fn pool(&self) -> &ArrayPool<Date> {
        &self.pool
    }

    fn filler(&self) -> Date {
        jiff::civil::date(1970, 1, 1)
    }

    fn read(
        &self,
        cursor: &mut ReadCursor,
        _element: &SchemaElement,
        dest: &mut [Date],
        offset: usize,
    ) -> Result<usize> {
        read_fixed(cursor, dest, offset, |b: [u8; 4]| days_to_date(i32::from_le_bytes(b)))
    }

    fn write(
        &self,
        out: &mut BytesMut,
        _element: &SchemaElement,
        source: &[Date],
        offset: usize,
        count: usize,
    ) -> Result<()> {
        for date in source_range(source, offset, count)? {
            out.put_i32_le(date_to_days(date)?);
        }
        Ok(())
    }

    fn compare(&self, a: &Date, b: &Date) -> Ordering {
        a.cmp(b)
    }
}

fn physical_for_time(unit: TimeUnit) -> Type {
    match unit {
        TimeUnit::Millis => Type::INT32,
        TimeUnit::Micros | TimeUnit::Nanos => Type::INT64,
    }
}

fn nanos_per_unit(unit: TimeUnit) -> i64 {
    NANOS_PER_SECOND / unit.per_second()
}

/// Time of day: INT32 milliseconds, or INT64 micro/nanoseconds.
#[derive(Debug)]
pub struct TimeCodec {
    unit: TimeUnit,
    pool: ArrayPool<Time>,
}

impl TimeCodec {
    pub fn new(unit: TimeUnit, pools: &PoolSet) -> Self {
        Self {
            unit,
            pool: pools.time.clone(),
        }
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    fn from_units(&self, value: i64) -> Result<Time> {
        let nanos = value
            .checked_mul(nanos_per_unit(self.unit))
            .filter(|n| (0..NANOS_PER_DAY).contains(n))
            .ok_or_else(|| {
                ParquetError::conversion(format!("time of day {} ({:?}) out of range", value, self.unit))
            })?;
        let secs = nanos / NANOS_PER_SECOND;
        Time::new(
            (secs / 3600) as i8,
            (secs / 60 % 60) as i8,
            (secs % 60) as i8,
            (nanos % NANOS_PER_SECOND) as i32,
        )
        .map_err(|e| jiff_err("invalid time of day", e))
    }

    fn to_units(&self, time: &Time) -> i64 {
        let secs = i64::from(time.hour()) * 3600 + i64::from(time.minute()) * 60 + i64::from(time.second());
        let nanos = secs * NANOS_PER_SECOND + i64::from(time.subsec_nanosecond());
        nanos / nanos_per_unit(self.unit)
    }
}

impl DataCodec for TimeCodec {
    type Value = Time;

    fn is_match(element: &SchemaElement, _options: &FormatOptions) -> bool {
        match element.annotation() {
            Some(ColumnAnnotation::Time(unit)) => element.physical_type == Some(physical_for_time(unit)),
            _ => false,
        }
    }

    fn name(&self) -> &'static str {
        "Time"
    }

    fn pool(&self) -> &ArrayPool<Time> {
        &self.pool
    }

    fn filler(&self) -> Time {
        Time::midnight()
    }

    fn read(
        &self,
        cursor: &mut ReadCursor,
        _element: &SchemaElement,
        dest: &mut [Time],
        offset: usize,
    ) -> Result<usize> {
        match self.unit {
            TimeUnit::Millis => read_fixed(cursor, dest, offset, |b: [u8; 4]| {
                self.from_units(i64::from(i32::from_le_bytes(b)))
            }),
            TimeUnit::Micros | TimeUnit::Nanos => {
                read_fixed(cursor, dest, offset, |b: [u8; 8]| self.from_units(i64::from_le_bytes(b)))
            }
        }
    }

    fn write(
        &self,
        out: &mut BytesMut,
        _element: &SchemaElement,
        source: &[Time],
        offset: usize,
        count: usize,
    ) -> Result<()> {
        for time in source_range(source, offset, count)? {
            let units = self.to_units(time);
            match self.unit {
                // Milliseconds in a day always fit an INT32.
                TimeUnit::Millis => out.put_i32_le(units as i32),
                TimeUnit::Micros | TimeUnit::Nanos => out.put_i64_le(units),
            }
        }
        Ok(())
    }

    fn compare(&self, a: &Time, b: &Time) -> Ordering {
        a.cmp(b)
    }
}

/// INT64 instants in milli, micro or nanoseconds since the epoch.
#[derive(Debug)]
pub struct TimestampCodec {
    unit: TimeUnit,
    pool: ArrayPool<Timestamp>,
}

impl TimestampCodec {
    pub fn new(unit: TimeUnit, pools: &PoolSet) -> Self {
        Self {
            unit,
            pool: pools.timestamp.clone(),
        }
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    fn from_units(&self, value: i64) -> Result<Timestamp> {
        let ts = match self.unit {
            TimeUnit::Millis => Timestamp::from_millisecond(value),
            TimeUnit::Micros => Timestamp::from_microsecond(value),
            TimeUnit::Nanos => Timestamp::from_nanosecond(i128::from(value)),
        };
        ts.map_err(|e| jiff_err("timestamp out of range", e))
    }

    fn to_units(&self, ts: &Timestamp) -> Result<i64> {
        match self.unit {
            TimeUnit::Millis => Ok(ts.as_millisecond()),
            TimeUnit::Micros => Ok(ts.as_microsecond()),
            TimeUnit::Nanos => i64::try_from(ts.as_nanosecond()).map_err(|_| {
                ParquetError::conversion(format!("timestamp {} does not fit INT64 nanoseconds", ts))
            }),
        }
    }
}

impl DataCodec for TimestampCodec {
    type Value = Timestamp;

    fn is_match(element: &SchemaElement, _options: &FormatOptions) -> bool {
        element.physical_type == Some(Type::INT64)
            && matches!(element.annotation(), Some(ColumnAnnotation::Timestamp(_)))
    }

    fn name(&self) -> &'static str {
        "Timestamp"
    }

    fn pool(&self) -> &ArrayPool<Timestamp> {
        &self.pool
    }

    fn filler(&self) -> Timestamp {
        Timestamp::UNIX_EPOCH
    }

    fn read(
        &self,
        cursor: &mut ReadCursor,
        _element: &SchemaElement,
        dest: &mut [Timestamp],
        offset: usize,
    ) -> Result<usize> {
        read_fixed(cursor, dest, offset, |b: [u8; 8]| self.from_units(i64::from_le_bytes(b)))
    }

    fn write(
        &self,
        out: &mut BytesMut,
        _element: &SchemaElement,
        source: &[Timestamp],
        offset: usize,
        count: usize,
    ) -> Result<()> {
        for ts in source_range(source, offset, count)? {
            out.put_i64_le(self.to_units(ts)?);
        }
        Ok(())
    }

    fn compare(&self, a: &Timestamp, b: &Timestamp) -> Ordering {
        a.cmp(b)
    }
}

/// INTERVAL: FIXED_LEN_BYTE_ARRAY(12) of little-endian months, days and
/// milliseconds.
#[derive(Debug)]
pub struct IntervalCodec {
    pool: ArrayPool<Interval>,
}

impl IntervalCodec {
    pub fn new(pools: &PoolSet) -> Self {
        Self {
            pool: pools.interval.clone(),
        }
    }
}

impl DataCodec for IntervalCodec {
    type Value = Interval;

    fn is_match(element: &SchemaElement, _options: &FormatOptions) -> bool {
        element.physical_type == Some(Type::FIXED_LEN_BYTE_ARRAY)
            && element.annotation() == Some(ColumnAnnotation::Interval)
    }

    fn name(&self) -> &'static str {
        "Interval"
    }

    fn pool(&self) -> &ArrayPool<Interval> {
        &self.pool
    }

    fn filler(&self) -> Interval {
        Interval::default()
    }

    fn read(
        &self,
        cursor: &mut ReadCursor,
        _element: &SchemaElement,
        dest: &mut [Interval],
        offset: usize,
    ) -> Result<usize> {
        read_fixed(cursor, dest, offset, |b: [u8; 12]| {
            let part = |i: usize| u32::from_le_bytes([b[i], b[i + 1], b[i + 2], b[i + 3]]);
            Ok(Interval::new(part(0), part(4), part(8)))
        })
    }

    fn write(
        &self,
        out: &mut BytesMut,
        _element: &SchemaElement,
        source: &[Interval],
        offset: usize,
        count: usize,
    ) -> Result<()> {
        let values = source_range(source, offset, count)?;
        out.reserve(values.len() * 12);
        for interval in values {
            out.put_u32_le(interval.months);
            out.put_u32_le(interval.days);
            out.put_u32_le(interval.millis);
        }
        Ok(())
    }

    fn compare(&self, a: &Interval, b: &Interval) -> Ordering {
        a.cmp(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ConvertedType, FieldRepetitionType, LogicalType};

    fn leaf(physical: Type) -> SchemaElement {
        SchemaElement::new_leaf("t", physical, FieldRepetitionType::OPTIONAL)
    }

    #[test]
    fn test_int96_epoch() {
        let codec = Int96Codec::new(&PoolSet::default());
        // 1 second past midnight on Julian day 2440588.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1_000_000_000i64.to_le_bytes());
        bytes.extend_from_slice(&2_440_588i32.to_le_bytes());
        let mut cursor = ReadCursor::new(bytes.clone());
        let mut dest = [Timestamp::UNIX_EPOCH];
        codec.read(&mut cursor, &leaf(Type::INT96), &mut dest, 0).unwrap();
        assert_eq!(dest[0], Timestamp::from_second(1).unwrap());

        let mut out = BytesMut::new();
        codec.write(&mut out, &leaf(Type::INT96), &dest, 0, 1).unwrap();
        assert_eq!(&out[..], &bytes[..]);
    }

    #[test]
    fn test_int96_before_epoch() {
        let codec = Int96Codec::new(&PoolSet::default());
        let ts = Timestamp::from_second(-1).unwrap();
        let mut out = BytesMut::new();
        codec.write(&mut out, &leaf(Type::INT96), &[ts], 0, 1).unwrap();
        let mut cursor = ReadCursor::new(out.freeze());
        let mut dest = [Timestamp::UNIX_EPOCH];
        codec.read(&mut cursor, &leaf(Type::INT96), &mut dest, 0).unwrap();
        assert_eq!(dest[0], ts);
    }

    #[test]
    fn test_date_days() {
        let codec = DateCodec::new(&PoolSet::default());
        let element = leaf(Type::INT32).with_converted_type(ConvertedType::DATE);
        let mut cursor = ReadCursor::new((-1i32).to_le_bytes().to_vec());
        let mut dest = [codec.filler()];
        codec.read(&mut cursor, &element, &mut dest, 0).unwrap();
        assert_eq!(dest[0], jiff::civil::date(1969, 12, 31));

        let mut out = BytesMut::new();
        codec
            .write(&mut out, &element, &[jiff::civil::date(2000, 1, 1)], 0, 1)
            .unwrap();
        assert_eq!(&out[..], &10_957i32.to_le_bytes());
    }

    #[test]
    fn test_time_units() {
        let millis = TimeCodec::new(TimeUnit::Millis, &PoolSet::default());
        let element = leaf(Type::INT32).with_converted_type(ConvertedType::TIME_MILLIS);
        let mut cursor = ReadCursor::new(3_723_004i32.to_le_bytes().to_vec());
        let mut dest = [Time::midnight()];
        millis.read(&mut cursor, &element, &mut dest, 0).unwrap();
        assert_eq!(dest[0], jiff::civil::time(1, 2, 3, 4_000_000));

        let nanos = TimeCodec::new(TimeUnit::Nanos, &PoolSet::default());
        let element = leaf(Type::INT64).with_logical_type(LogicalType::Time {
            is_adjusted_to_utc: false,
            unit: TimeUnit::Nanos,
        });
        let mut out = BytesMut::new();
        nanos.write(&mut out, &element, &dest, 0, 1).unwrap();
        assert_eq!(&out[..], &3_723_004_000_000i64.to_le_bytes());
    }

    #[test]
    fn test_time_out_of_range() {
        let codec = TimeCodec::new(TimeUnit::Micros, &PoolSet::default());
        let element = leaf(Type::INT64).with_converted_type(ConvertedType::TIME_MICROS);
        let mut cursor = ReadCursor::new((-5i64).to_le_bytes().to_vec());
        let mut dest = [Time::midnight()];
        assert!(matches!(
            codec.read(&mut cursor, &element, &mut dest, 0),
            Err(ParquetError::Conversion(_))
        ));
    }

    #[test]
    fn test_time_physical_must_match_unit() {
        let options = FormatOptions::default();
        let wrong = leaf(Type::INT32).with_logical_type(LogicalType::Time {
            is_adjusted_to_utc: true,
            unit: TimeUnit::Micros,
        });
        assert!(!TimeCodec::is_match(&wrong, &options));
    }

    #[test]
    fn test_timestamp_units() {
        let codec = TimestampCodec::new(TimeUnit::Micros, &PoolSet::default());
        let element = leaf(Type::INT64).with_converted_type(ConvertedType::TIMESTAMP_MICROS);
        let mut cursor = ReadCursor::new(1_500_000i64.to_le_bytes().to_vec());
        let mut dest = [Timestamp::UNIX_EPOCH];
        codec.read(&mut cursor, &element, &mut dest, 0).unwrap();
        assert_eq!(dest[0], Timestamp::from_millisecond(1_500).unwrap());
    }

    #[test]
    fn test_interval_layout() {
        let codec = IntervalCodec::new(&PoolSet::default());
        let element = leaf(Type::FIXED_LEN_BYTE_ARRAY)
            .with_type_length(12)
            .with_converted_type(ConvertedType::INTERVAL);
        let mut out = BytesMut::new();
        codec
            .write(&mut out, &element, &[Interval::new(1, 2, 3)], 0, 1)
            .unwrap();
        assert_eq!(&out[..], &[1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]);
        let decoded = codec.plain_decode(&element, Some(&out[..])).unwrap();
        assert_eq!(decoded, Some(Interval::new(1, 2, 3)));
    }
}

//! Timestamp payloads (Ion 1.0 binary, type id 6).
//!
//! A timestamp payload is a VarInt offset in minutes (negative zero encodes
//! an unknown offset), a VarUInt year, and then optional VarUInt components
//! month, day, hour, minute, second. The precision is determined by how far
//! the payload extends; an hour without a minute is malformed. At second
//! precision an optional fraction follows as a VarInt exponent plus an Int
//! coefficient covering the rest of the payload.

use crate::buffer::{ByteReader, SpanBuffer};
use crate::decimal::Decimal;
use crate::{fixed_int, var_int, var_uint, Error, Result};

/// How many components of a timestamp are significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precision {
    Year,
    Month,
    Day,
    Minute,
    Second,
}

/// A decoded timestamp value.
///
/// Komponenten jenseits der Präzision sind immer 0 bzw. 1 und werden von
/// `PartialEq` mitverglichen; die Konstruktoren setzen sie deterministisch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    /// Local-time offset in minutes; `None` is the unknown offset (`-00:00`).
    pub offset_minutes: Option<i32>,
    pub year: u32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Sub-second fraction; only meaningful at [`Precision::Second`] and
    /// restricted to a negative exponent and non-negative coefficient.
    pub fraction: Option<Decimal>,
    pub precision: Precision,
}

impl Timestamp {
    /// Year precision, unknown offset.
    pub fn from_year(year: u32) -> Self {
        Self {
            offset_minutes: None,
            year,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
            fraction: None,
            precision: Precision::Year,
        }
    }

    /// Day precision, unknown offset.
    pub fn from_date(year: u32, month: u8, day: u8) -> Self {
        Self {
            month,
            day,
            precision: Precision::Day,
            ..Self::from_year(year)
        }
    }

    /// Minute precision, unknown offset.
    pub fn from_minute(year: u32, month: u8, day: u8, hour: u8, minute: u8) -> Self {
        Self {
            hour,
            minute,
            precision: Precision::Minute,
            ..Self::from_date(year, month, day)
        }
    }

    /// Second precision, unknown offset.
    pub fn from_second(year: u32, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            second,
            precision: Precision::Second,
            ..Self::from_minute(year, month, day, hour, minute)
        }
    }

    /// Sets a known local-time offset in minutes.
    pub fn with_offset(mut self, minutes: i32) -> Self {
        self.offset_minutes = Some(minutes);
        self
    }

    /// Sets the sub-second fraction (second precision only).
    pub fn with_fraction(mut self, fraction: Decimal) -> Self {
        self.fraction = Some(fraction);
        self
    }

    /// Validates component ranges against the precision.
    fn validate(&self) -> Result<()> {
        // [`read`] begrenzt den Offset-Betrag auf 31 Bits; i32::MIN käme
        // nie zurück.
        if self.offset_minutes == Some(i32::MIN) {
            return Err(Error::malformed("timestamp offset exceeds 31 bits"));
        }
        if self.precision >= Precision::Month && !(1..=12).contains(&self.month) {
            return Err(Error::malformed("timestamp month out of range 1..=12"));
        }
        if self.precision >= Precision::Day && !(1..=31).contains(&self.day) {
            return Err(Error::malformed("timestamp day out of range 1..=31"));
        }
        if self.precision >= Precision::Minute && (self.hour > 23 || self.minute > 59) {
            return Err(Error::malformed("timestamp hour/minute out of range"));
        }
        if self.precision >= Precision::Second && self.second > 59 {
            return Err(Error::malformed("timestamp second out of range 0..=59"));
        }
        if let Some(frac) = self.fraction {
            if self.precision < Precision::Second {
                return Err(Error::malformed(
                    "timestamp fraction requires second precision",
                ));
            }
            if frac.exponent >= 0 || frac.coefficient < 0 {
                return Err(Error::malformed(
                    "timestamp fraction must have a negative exponent and a non-negative coefficient",
                ));
            }
        }
        Ok(())
    }
}

/// Number of payload bytes [`write`] will emit for `value`.
pub fn payload_len(value: &Timestamp) -> u64 {
    let mut len = match value.offset_minutes {
        Some(minutes) => var_int::encoded_len(i64::from(minutes)),
        None => 1, // negative Null ist immer ein Oktett
    };
    len += var_uint::encoded_len(u64::from(value.year));
    if value.precision >= Precision::Month {
        len += 1; // Monat 1..=12 ist immer ein VarUInt-Oktett
    }
    if value.precision >= Precision::Day {
        len += 1;
    }
    if value.precision >= Precision::Minute {
        len += 2;
    }
    if value.precision >= Precision::Second {
        len += 1;
    }
    if let Some(frac) = value.fraction {
        len += var_int::encoded_len(frac.exponent) + fixed_int::int_len(frac.coefficient);
    }
    len
}

/// Appends the timestamp payload for `value`.
pub fn write(buf: &mut SpanBuffer, value: &Timestamp) -> Result<u64> {
    value.validate()?;
    let mut written = match value.offset_minutes {
        Some(minutes) => var_int::write(buf, i64::from(minutes))?,
        None => var_int::write_raw(buf, true, 0),
    };
    written += var_uint::write(buf, u64::from(value.year));
    if value.precision >= Precision::Month {
        written += var_uint::write(buf, u64::from(value.month));
    }
    if value.precision >= Precision::Day {
        written += var_uint::write(buf, u64::from(value.day));
    }
    if value.precision >= Precision::Minute {
        written += var_uint::write(buf, u64::from(value.hour));
        written += var_uint::write(buf, u64::from(value.minute));
    }
    if value.precision >= Precision::Second {
        written += var_uint::write(buf, u64::from(value.second));
    }
    if let Some(frac) = value.fraction {
        written += var_int::write(buf, frac.exponent)?;
        written += fixed_int::write_int(buf, frac.coefficient)?;
    }
    Ok(written)
}

/// Reads a timestamp payload of exactly `len` bytes.
pub fn read(reader: &mut ByteReader<'_>, len: u64) -> Result<Timestamp> {
    let end = reader.position() + len;
    let over = |reader: &ByteReader<'_>| reader.position() > end;

    let (negative, magnitude) = var_int::read_raw(reader)?;
    let offset_minutes = if negative && magnitude == 0 {
        None
    } else {
        if magnitude > i32::MAX as u64 {
            return Err(Error::malformed("timestamp offset exceeds 31 bits"));
        }
        let minutes = magnitude as i32;
        Some(if negative { -minutes } else { minutes })
    };

    let year = var_uint::read(reader)?;
    if year > u32::MAX as u64 {
        return Err(Error::malformed("timestamp year exceeds 32 bits"));
    }
    if over(reader) {
        return Err(Error::malformed(
            "timestamp component overruns the declared payload length",
        ));
    }

    let mut ts = Timestamp::from_year(year as u32);
    ts.offset_minutes = offset_minutes;

    // Komponenten in fester Reihenfolge, solange das Payload reicht;
    // die Präzision ergibt sich aus der Payload-Ausdehnung.
    let mut component = |reader: &mut ByteReader<'_>| -> Result<Option<u64>> {
        if reader.position() >= end {
            return Ok(None);
        }
        let v = var_uint::read(reader)?;
        if reader.position() > end {
            return Err(Error::malformed(
                "timestamp component overruns the declared payload length",
            ));
        }
        Ok(Some(v))
    };

    if let Some(month) = component(reader)? {
        ts.month = month.try_into().map_err(|_| Error::malformed("timestamp month exceeds 8 bits"))?;
        ts.precision = Precision::Month;
        if let Some(day) = component(reader)? {
            ts.day = day.try_into().map_err(|_| Error::malformed("timestamp day exceeds 8 bits"))?;
            ts.precision = Precision::Day;
            if let Some(hour) = component(reader)? {
                let minute = component(reader)?.ok_or_else(|| {
                    Error::malformed("timestamp hour without a minute component")
                })?;
                ts.hour = hour.try_into().map_err(|_| Error::malformed("timestamp hour exceeds 8 bits"))?;
                ts.minute = minute.try_into().map_err(|_| Error::malformed("timestamp minute exceeds 8 bits"))?;
                ts.precision = Precision::Minute;
                if let Some(second) = component(reader)? {
                    ts.second = second.try_into().map_err(|_| Error::malformed("timestamp second exceeds 8 bits"))?;
                    ts.precision = Precision::Second;
                    if reader.position() < end {
                        let exponent = var_int::read(reader)?;
                        let remaining = end.checked_sub(reader.position()).ok_or_else(|| {
                            Error::malformed(
                                "timestamp fraction overruns the declared payload length",
                            )
                        })?;
                        let coefficient = fixed_int::read_int(reader, remaining)?;
                        ts.fraction = Some(Decimal::new(coefficient, exponent));
                    }
                }
            }
        }
    }

    ts.validate()?;
    Ok(ts)
}

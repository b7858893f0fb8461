//! Decimal replacements for SQLite's `sum`, `total` and `avg`.
//!
//! The built-ins accumulate in binary floating point, so `0.10 + 0.20 - 0.30`
//! comes out as a tiny non-zero number. These accumulate in `Decimal`
//! instead. Stored REAL values are read back through their shortest decimal
//! form, which is the text that was inserted.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rusqlite::functions::{Aggregate, Context, FunctionFlags};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, Error, Result};
use std::str::FromStr;

#[derive(Debug, Clone, Copy)]
enum Kind {
    Sum,
    Total,
    Avg,
}

struct DecimalAggregate(Kind);

#[derive(Debug, Default)]
struct Accumulator {
    sum: Decimal,
    count: i64,
}

pub(crate) fn register(conn: &Connection) -> Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;
    conn.create_aggregate_function("sum", 1, flags, DecimalAggregate(Kind::Sum))?;
    conn.create_aggregate_function("total", 1, flags, DecimalAggregate(Kind::Total))?;
    conn.create_aggregate_function("avg", 1, flags, DecimalAggregate(Kind::Avg))?;
    Ok(())
}

impl Aggregate<Accumulator, Value> for DecimalAggregate {
    fn init(&self, _: &mut Context<'_>) -> Result<Accumulator> {
        Ok(Accumulator::default())
    }

    fn step(&self, ctx: &mut Context<'_>, acc: &mut Accumulator) -> Result<()> {
        let Some(value) = decimal(ctx.get_raw(0))? else {
            return Ok(());
        };
        acc.sum = acc
            .sum
            .checked_add(value)
            .ok_or_else(|| failure("decimal overflow"))?;
        acc.count += 1;
        Ok(())
    }

    fn finalize(&self, _: &mut Context<'_>, acc: Option<Accumulator>) -> Result<Value> {
        let acc = acc.filter(|a| a.count > 0);
        match (self.0, acc) {
            (Kind::Total, None) => Ok(Value::Real(0.0)),
            (_, None) => Ok(Value::Null),
            (Kind::Sum, Some(acc)) => value(acc.sum),
            (Kind::Total, Some(acc)) => real(acc.sum).map(Value::Real),
            (Kind::Avg, Some(acc)) => {
                let avg = acc
                    .sum
                    .checked_div(Decimal::from(acc.count))
                    .ok_or_else(|| failure("decimal overflow"))?;
                real(avg).map(Value::Real)
            }
        }
    }
}

/// NULL is skipped; text that is not a number counts as zero, as in SQLite.
fn decimal(raw: ValueRef<'_>) -> Result<Option<Decimal>> {
    match raw {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(i) => Ok(Some(Decimal::from(i))),
        ValueRef::Real(f) => Decimal::from_str(&f.to_string())
            .map(Some)
            .map_err(|e| failure(&format!("{f} is not representable as a decimal: {e}"))),
        ValueRef::Text(t) => Ok(Some(
            std::str::from_utf8(t)
                .ok()
                .and_then(|s| Decimal::from_str(s.trim()).ok())
                .unwrap_or_default(),
        )),
        ValueRef::Blob(_) => Ok(Some(Decimal::ZERO)),
    }
}

/// Whole results stay integers; anything else goes out as the nearest double
/// to the exact decimal.
fn value(d: Decimal) -> Result<Value> {
    if d.fract().is_zero() {
        if let Some(i) = d.to_i64() {
            return Ok(Value::Integer(i));
        }
    }
    real(d).map(Value::Real)
}

fn real(d: Decimal) -> Result<f64> {
    d.normalize()
        .to_string()
        .parse()
        .map_err(|e| failure(&format!("{d} does not fit a double: {e}")))
}

fn failure(message: &str) -> Error {
    Error::UserFunctionError(message.to_string().into())
}

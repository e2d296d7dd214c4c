//! Разбор табличного текста в записи фиксированной схемы

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::{MlError, Result};
use crate::types::{CleanedRecord, RawRecord};

const DEFAULT_PROMOTION_FREQUENCY: i64 = 0;
const DEFAULT_SHELF_LEVEL: i64 = 3;

/// Индексы известных колонок в заголовке
#[derive(Debug, Default)]
struct ColumnMap {
    product_id: Option<usize>,
    product_name: Option<usize>,
    category: Option<usize>,
    price: Option<usize>,
    cost: Option<usize>,
    units_sold: Option<usize>,
    profit: Option<usize>,
    promotion_frequency: Option<usize>,
    shelf_level: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut map = Self::default();
        for (idx, name) in headers.iter().enumerate() {
            let slot = match normalize_header(name) {
                "product_id" => &mut map.product_id,
                "product_name" => &mut map.product_name,
                "category" => &mut map.category,
                "price" => &mut map.price,
                "cost" => &mut map.cost,
                "units_sold" => &mut map.units_sold,
                "profit" => &mut map.profit,
                "promotion_frequency" => &mut map.promotion_frequency,
                "shelf_level" => &mut map.shelf_level,
                _ => continue,
            };
            // При повторе заголовка побеждает последняя колонка
            *slot = Some(idx);
        }
        map
    }

    fn build(&self, values: &StringRecord) -> RawRecord {
        let get = |idx: Option<usize>| {
            idx.and_then(|i| values.get(i))
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };

        RawRecord {
            product_id: get(self.product_id),
            product_name: get(self.product_name),
            category: get(self.category),
            price: get(self.price),
            cost: get(self.cost),
            units_sold: get(self.units_sold),
            profit: get(self.profit),
            promotion_frequency: get(self.promotion_frequency),
            shelf_level: get(self.shelf_level),
        }
    }
}

/// Excel сохраняет UTF-8 с BOM перед первым заголовком
fn normalize_header(name: &str) -> &str {
    name.trim().trim_start_matches('\u{feff}').trim()
}

/// Первая строка - заголовок, каждая следующая - запись.
///
/// Короткие строки допустимы, недостающие поля пустые. Нечитаемая строка
/// превращается в пустую запись и дальше считается некорректной.
pub fn parse_records(text: &str, delimiter: char) -> Result<Vec<RawRecord>> {
    let delimiter = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| {
            MlError::InvalidConfig(format!(
                "delimiter must be a single ASCII character, got {:?}",
                delimiter
            ))
        })?;

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.trim().as_bytes());

    let columns = ColumnMap::from_headers(reader.headers()?);

    let mut records = Vec::new();
    for row in reader.records() {
        match row {
            Ok(values) => records.push(columns.build(&values)),
            Err(e) => {
                tracing::warn!("Unreadable row: {}", e);
                records.push(RawRecord::default());
            }
        }
    }

    Ok(records)
}

impl RawRecord {
    pub fn has_required_fields(&self) -> bool {
        [&self.price, &self.cost, &self.units_sold, &self.profit]
            .iter()
            .all(|value| !value.is_empty())
    }

    /// Приведение к числовым типам. `None`, если обязательное поле отсутствует
    /// или любое заполненное числовое поле не разбирается.
    pub fn to_cleaned(&self) -> Option<CleanedRecord> {
        if !self.has_required_fields() {
            return None;
        }

        Some(CleanedRecord {
            product_id: self.product_id.clone(),
            product_name: self.product_name.clone(),
            category: self.category.clone(),
            price: parse_float(&self.price)?,
            cost: parse_float(&self.cost)?,
            units_sold: parse_int(&self.units_sold)?,
            promotion_frequency: parse_optional_int(
                &self.promotion_frequency,
                DEFAULT_PROMOTION_FREQUENCY,
            )?,
            shelf_level: parse_optional_int(&self.shelf_level, DEFAULT_SHELF_LEVEL)?,
            profit: parse_float(&self.profit)?,
        })
    }
}

fn parse_float(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Целое или конечная десятичная дробь, усеченная к нулю ("12.7" -> 12)
fn parse_int(value: &str) -> Option<i64> {
    if let Ok(v) = value.parse::<i64>() {
        return Some(v);
    }
    let v = parse_float(value)?.trunc();
    if v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

fn parse_optional_int(value: &str, default: i64) -> Option<i64> {
    if value.is_empty() {
        Some(default)
    } else {
        parse_int(value)
    }
}

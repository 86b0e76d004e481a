use crate::models::{ProductRecord, RawProductRow};
use bigdecimal::{BigDecimal, Zero};

const DEFAULT_DESCUENTO: &str = "0000";
const DEFAULT_LOCALIZACION: &str = "SU";

/// 字符串清洗: 剔除换行后去首尾空白
fn clean_text(value: Option<String>) -> String {
    value
        .map(|v| v.replace(['\n', '\r'], "").trim().to_string())
        .unwrap_or_default()
}

/// 数值字段: 空值或负数一律回退到字段默认值 (负数按非法输入处理, 不是合法负量)
fn clean_decimal(value: Option<BigDecimal>, default: i64) -> BigDecimal {
    match value {
        Some(v) if v >= BigDecimal::zero() => v,
        _ => BigDecimal::from(default),
    }
}

fn clean_quantity(value: Option<i64>, default: i64) -> i64 {
    match value {
        Some(v) if v >= 0 => v,
        _ => default,
    }
}

fn clean_coded(value: Option<String>, default: &str) -> String {
    let cleaned = clean_text(value);
    if cleaned.is_empty() {
        default.to_string()
    } else {
        cleaned
    }
}

/// 单行规范化 — 纯函数
///
/// referencia 清洗后为空的行无法修复 (缺唯一键), 返回 None 由调用方丢弃。
pub fn normalize_row(row: RawProductRow, timestamp_ms: i64) -> Option<ProductRecord> {
    let referencia = clean_text(row.referencia);
    if referencia.is_empty() {
        return None;
    }

    Some(ProductRecord {
        referencia,
        referencia_proveedor: clean_text(row.referencia_proveedor),
        descripcion: clean_text(row.descripcion),
        cantidad_bulto: clean_quantity(row.cantidad_bulto, 1),
        unidad_venta: clean_decimal(row.unidad_venta, 1),
        familia: clean_text(row.familia),
        stock_actual: clean_decimal(row.stock_actual, 0),
        precio_actual: clean_decimal(row.precio_actual, 0),
        descuento: clean_coded(row.descuento, DEFAULT_DESCUENTO),
        localizacion: clean_coded(row.localizacion, DEFAULT_LOCALIZACION),
        estado: clean_text(row.estado),
        ultima_actualizacion: timestamp_ms,
    })
}

/// 整个结果集规范化, 丢弃缺 referencia 的行并告警
pub fn normalize_rows(rows: Vec<RawProductRow>, timestamp_ms: i64) -> Vec<ProductRecord> {
    let total = rows.len();
    let records: Vec<ProductRecord> = rows
        .into_iter()
        .filter_map(|row| normalize_row(row, timestamp_ms))
        .collect();

    let dropped = total - records.len();
    if dropped > 0 {
        tracing::warn!("丢弃 {} 行缺少 referencia 的记录", dropped);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(referencia: &str) -> RawProductRow {
        RawProductRow {
            referencia: Some(referencia.to_string()),
            ..RawProductRow::default()
        }
    }

    #[test]
    fn negative_pack_quantity_defaults_to_one() {
        let mut row = raw("A1");
        row.cantidad_bulto = Some(-5);
        let record = normalize_row(row, 0).unwrap();
        assert_eq!(record.cantidad_bulto, 1);
    }

    #[test]
    fn null_discount_defaults_to_zeros() {
        let record = normalize_row(raw("A1"), 0).unwrap();
        assert_eq!(record.descuento, "0000");
    }

    #[test]
    fn null_location_defaults_to_su() {
        let record = normalize_row(raw("A1"), 0).unwrap();
        assert_eq!(record.localizacion, "SU");
    }

    #[test]
    fn embedded_newlines_are_stripped() {
        let mut row = raw("A1");
        row.descripcion = Some("a\nb".to_string());
        let record = normalize_row(row, 0).unwrap();
        assert_eq!(record.descripcion, "ab");
    }

    #[test]
    fn strings_are_trimmed() {
        let mut row = raw("  A1  ");
        row.familia = Some("  FERRETERIA \r\n".to_string());
        let record = normalize_row(row, 0).unwrap();
        assert_eq!(record.referencia, "A1");
        assert_eq!(record.familia, "FERRETERIA");
    }

    #[test]
    fn negative_price_and_stock_default_to_zero() {
        let mut row = raw("A1");
        row.precio_actual = Some(BigDecimal::from(-10));
        row.stock_actual = Some(BigDecimal::from(-3));
        let record = normalize_row(row, 0).unwrap();
        assert_eq!(record.precio_actual, BigDecimal::from(0));
        assert_eq!(record.stock_actual, BigDecimal::from(0));
    }

    #[test]
    fn zero_quantity_is_kept_as_is() {
        let mut row = raw("A1");
        row.cantidad_bulto = Some(0);
        let record = normalize_row(row, 0).unwrap();
        assert_eq!(record.cantidad_bulto, 0);
    }

    #[test]
    fn timestamp_is_stamped_on_every_record() {
        let record = normalize_row(raw("A1"), 1_700_000_000_123).unwrap();
        assert_eq!(record.ultima_actualizacion, 1_700_000_000_123);
    }

    #[test]
    fn rows_without_reference_are_dropped() {
        let rows = vec![raw("A1"), raw("   "), RawProductRow::default()];
        let records = normalize_rows(rows, 0);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].referencia, "A1");
    }
}

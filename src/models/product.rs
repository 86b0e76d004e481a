use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 数据库原始行 — 规范化前, 所有列按可空处理
#[derive(Debug, Clone, Default, FromRow)]
pub struct RawProductRow {
    pub referencia: Option<String>,
    pub referencia_proveedor: Option<String>,
    pub descripcion: Option<String>,
    pub cantidad_bulto: Option<i64>,
    pub unidad_venta: Option<BigDecimal>,
    pub familia: Option<String>,
    pub stock_actual: Option<BigDecimal>,
    pub precio_actual: Option<BigDecimal>,
    pub descuento: Option<String>,
    pub localizacion: Option<String>,
    pub estado: Option<String>,
}

/// 规范化后的商品记录 — 累积与发布的统一形态
///
/// 不变量: referencia 非空; 字符串字段已去除首尾空白与换行;
/// 数值字段非负 (负输入在规范化时被替换为字段默认值)。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub referencia: String,
    pub referencia_proveedor: String,
    pub descripcion: String,
    pub cantidad_bulto: i64,
    pub unidad_venta: BigDecimal,
    pub familia: String,
    pub stock_actual: BigDecimal,
    pub precio_actual: BigDecimal,
    pub descuento: String,
    pub localizacion: String,
    pub estado: String,
    /// 规范化时打上的毫秒时间戳
    pub ultima_actualizacion: i64,
}

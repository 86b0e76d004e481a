use crate::models::RawProductRow;
use sqlx::PgPool;

/// 增量查询: 回看窗口内任一关联表有更新的商品 (窗口分钟数由调用方传入)
pub async fn fetch_incremental(
    pool: &PgPool,
    window_minutes: i32,
) -> Result<Vec<RawProductRow>, sqlx::Error> {
    sqlx::query_as::<_, RawProductRow>(
        r#"
        SELECT a.id_articulo AS referencia,
               p.referencia_proveedor,
               a.descrip AS descripcion,
               COALESCE(a.cantidad_bulto, 1)::bigint AS cantidad_bulto,
               COALESCE(ca.unidad_venta, 1) AS unidad_venta,
               f.familia,
               COALESCE(s.stock_actual, 0) AS stock_actual,
               COALESCE(pr.precio_actual, 0) AS precio_actual,
               COALESCE(ca.descuento, '0000') AS descuento,
               COALESCE(l.localizacion, 'SU') AS localizacion,
               a.estado
        FROM articulos a
        LEFT JOIN (
            SELECT id_proveedor,
                   id_articulo,
                   articulo AS referencia_proveedor,
                   fecha_insert_update
            FROM prov_articulos
            WHERE id_proveedor <> '410000051'
        ) p ON p.id_articulo = a.id_articulo
           AND p.id_proveedor = a.id_proveedor_preferencial
        LEFT JOIN (
            SELECT id_articulo,
                   COALESCE(tipo_descuento_max, '0000') AS descuento,
                   COALESCE(ud_venta, 0) AS unidad_venta,
                   pers_no_activo_central,
                   fecha_insert_update
            FROM conf_articulos
        ) ca ON ca.id_articulo = a.id_articulo
        LEFT JOIN (
            SELECT id_familia, descrip AS familia, fecha_insert_update
            FROM articulos_familias
        ) f ON f.id_familia = a.id_familia
        LEFT JOIN (
            SELECT id_articulo, COALESCE(stock, 0) AS stock_actual, fecha_insert_update
            FROM articulos_stock
            WHERE id_almacen = 1
        ) s ON s.id_articulo = a.id_articulo
        LEFT JOIN (
            SELECT id_articulo, COALESCE(precio, 0) AS precio_actual, fecha_insert_update
            FROM listas_precios_cli_art
            WHERE id_lista = 1
        ) pr ON pr.id_articulo = a.id_articulo
        LEFT JOIN (
            SELECT id_articulo, localizacion, fecha_insert_update
            FROM articulos_localizacion
            WHERE id_almacen = 1
        ) l ON l.id_articulo = a.id_articulo
        WHERE p.referencia_proveedor IS NOT NULL
          AND ca.pers_no_activo_central = 0
          AND (
              a.fecha_insert_update >= NOW() - make_interval(mins => $1)
           OR p.fecha_insert_update >= NOW() - make_interval(mins => $1)
           OR f.fecha_insert_update >= NOW() - make_interval(mins => $1)
           OR s.fecha_insert_update >= NOW() - make_interval(mins => $1)
           OR pr.fecha_insert_update >= NOW() - make_interval(mins => $1)
           OR l.fecha_insert_update >= NOW() - make_interval(mins => $1)
          )
        ORDER BY a.fecha_insert_update DESC
        "#,
    )
    .bind(window_minutes)
    .fetch_all(pool)
    .await
}

/// 全量查询: 当前全部有效商品, 不按时间过滤
pub async fn fetch_full(pool: &PgPool) -> Result<Vec<RawProductRow>, sqlx::Error> {
    sqlx::query_as::<_, RawProductRow>(
        r#"
        SELECT a.id_articulo AS referencia,
               p.referencia_proveedor,
               a.descrip AS descripcion,
               COALESCE(a.cantidad_bulto, 1)::bigint AS cantidad_bulto,
               COALESCE(ca.unidad_venta, 1) AS unidad_venta,
               f.familia,
               COALESCE(s.stock_actual, 0) AS stock_actual,
               COALESCE(pr.precio_actual, 0) AS precio_actual,
               COALESCE(ca.descuento, '0000') AS descuento,
               COALESCE(l.localizacion, 'SU') AS localizacion,
               a.estado
        FROM articulos a
        LEFT JOIN (
            SELECT id_proveedor,
                   id_articulo,
                   articulo AS referencia_proveedor
            FROM prov_articulos
            WHERE id_proveedor <> '410000051'
        ) p ON p.id_articulo = a.id_articulo
           AND p.id_proveedor = a.id_proveedor_preferencial
        LEFT JOIN (
            SELECT id_articulo,
                   COALESCE(tipo_descuento_max, '0000') AS descuento,
                   COALESCE(ud_venta, 0) AS unidad_venta,
                   pers_no_activo_central
            FROM conf_articulos
        ) ca ON ca.id_articulo = a.id_articulo
        LEFT JOIN (
            SELECT id_familia, descrip AS familia
            FROM articulos_familias
        ) f ON f.id_familia = a.id_familia
        LEFT JOIN (
            SELECT id_articulo, COALESCE(stock, 0) AS stock_actual
            FROM articulos_stock
            WHERE id_almacen = 1
        ) s ON s.id_articulo = a.id_articulo
        LEFT JOIN (
            SELECT id_articulo, COALESCE(precio, 0) AS precio_actual
            FROM listas_precios_cli_art
            WHERE id_lista = 1
        ) pr ON pr.id_articulo = a.id_articulo
        LEFT JOIN (
            SELECT id_articulo, localizacion
            FROM articulos_localizacion
            WHERE id_almacen = 1
        ) l ON l.id_articulo = a.id_articulo
        WHERE p.referencia_proveedor IS NOT NULL
          AND ca.pers_no_activo_central = 0
        ORDER BY a.fecha_insert_update DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

use catalog::TableSchema;
use common::SetKey;
use pretty_assertions_sorted::assert_eq;
use workload::{Compressor, DigestCompressor, Extractor, Query, SqlExtractor, WorkloadInfo};

fn shop() -> WorkloadInfo {
    let tables = vec![
        TableSchema::from_create_statement(
            "shop",
            "create table orders (id int primary key, customer int, placed datetime)",
        )
        .unwrap(),
        TableSchema::from_create_statement(
            "shop",
            "create table customers (id int primary key, name varchar(64))",
        )
        .unwrap(),
        TableSchema::from_create_statement("test", "create table t1 (a int)").unwrap(),
    ];
    let queries = vec![
        Query::new("shop", "select * from orders where customer = 1", 1),
        Query::new("shop", "select * from orders where customer = 7", 3),
        Query::new(
            "shop",
            "select o.id from orders o join customers c on o.customer = c.id \
             where c.name = 'x' order by o.placed",
            1,
        ),
        Query::new("test", "select * from t1 where a > 5", 1),
    ];
    WorkloadInfo::new(queries, tables)
}

#[test]
fn test_compress_then_extract() {
    let compressed = DigestCompressor.compress(&shop());
    assert_eq!(compressed.queries().len(), 3);

    let frequencies: Vec<(String, u64)> = compressed
        .queries()
        .iter()
        .map(|query| (query.text().clone(), query.frequency()))
        .collect();
    assert_eq!(
        frequencies,
        vec![
            ("select * from orders where customer = 1".to_string(), 4),
            ("select * from t1 where a > 5".to_string(), 1),
            (
                "select o.id from orders o join customers c on o.customer = c.id \
                 where c.name = 'x' order by o.placed"
                    .to_string(),
                1
            ),
        ]
    );

    let extracted = SqlExtractor::default().extract(&compressed).unwrap();
    let union: Vec<String> = extracted
        .indexable_columns()
        .iter()
        .map(SetKey::key)
        .collect();
    assert_eq!(
        union,
        vec![
            "shop.customers.id",
            "shop.customers.name",
            "shop.orders.customer",
            "shop.orders.placed",
            "test.t1.a",
        ]
    );
    // Compression already happened, so extraction keeps every query.
    assert_eq!(extracted.queries().len(), 3);
}

#[test]
fn test_compression_is_idempotent() {
    let once = DigestCompressor.compress(&shop());
    let twice = DigestCompressor.compress(&once);

    assert_eq!(once.queries().key_string(), twice.queries().key_string());
    assert_eq!(once, twice);
}

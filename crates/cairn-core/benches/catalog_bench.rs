use criterion::{Criterion, criterion_group, criterion_main};
use cairn_core::catalog::{Catalog, ColumnDef};
use cairn_core::oid::OidAllocator;
use cairn_core::txn::TransactionManager;
use cairn_core::types::{DEFAULT_DATABASE_OID, TypeId};
use std::sync::Arc;
use std::thread;

fn bench_bootstrap(c: &mut Criterion) {
    c.bench_function("bootstrap", |b| {
        b.iter(|| Catalog::new(Arc::new(TransactionManager::new())).unwrap());
    });
}

fn bench_oid_allocation(c: &mut Criterion) {
    c.bench_function("oid_next", |b| {
        let oids = OidAllocator::default();
        b.iter(|| oids.next());
    });
}

fn bench_oid_allocation_contended(c: &mut Criterion) {
    c.bench_function("oid_next_4_threads_10k", |b| {
        b.iter(|| {
            let oids = Arc::new(OidAllocator::default());
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let oids = Arc::clone(&oids);
                    thread::spawn(move || {
                        for _ in 0..2_500 {
                            oids.next();
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });
    });
}

fn bench_namespace_lookup(c: &mut Criterion) {
    let catalog = Catalog::new(Arc::new(TransactionManager::new())).unwrap();
    let txn = catalog.txn_manager().begin();
    let namespaces = catalog
        .namespace_handle(&txn, DEFAULT_DATABASE_OID)
        .unwrap();

    c.bench_function("namespace_entry_by_name", |b| {
        b.iter(|| namespaces.entry_by_name(&txn, "public").unwrap().unwrap());
    });
}

fn bench_relation_lookup(c: &mut Criterion) {
    // 100 user relations so the directory maps are not trivially small.
    let catalog = Catalog::new(Arc::new(TransactionManager::new())).unwrap();
    catalog
        .txn_manager()
        .transact(|txn| {
            for i in 0..100 {
                catalog.create_table(
                    txn,
                    DEFAULT_DATABASE_OID,
                    "public",
                    &format!("t{i:03}"),
                    &[ColumnDef::new("id", TypeId::Integer)],
                )?;
            }
            Ok(())
        })
        .unwrap();
    let txn = catalog.txn_manager().begin();

    c.bench_function("database_catalog_by_name", |b| {
        let mut i = 0u32;
        b.iter(|| {
            let name = format!("t{:03}", i % 100);
            catalog
                .database_catalog_by_name(&txn, DEFAULT_DATABASE_OID, &name)
                .unwrap();
            i += 1;
        });
    });

    c.bench_function("pg_class_entry_by_name", |b| {
        let classes = catalog.class_handle(&txn, DEFAULT_DATABASE_OID).unwrap();
        b.iter(|| classes.entry_by_name(&txn, "t050").unwrap().unwrap());
    });
}

fn bench_create_and_destroy(c: &mut Criterion) {
    c.bench_function("create_10_tables_then_destroy", |b| {
        let catalog = Catalog::new(Arc::new(TransactionManager::new())).unwrap();
        let mut round = 0u64;
        b.iter(|| {
            catalog
                .txn_manager()
                .transact(|txn| {
                    for i in 0..10 {
                        catalog.create_table(
                            txn,
                            DEFAULT_DATABASE_OID,
                            "public",
                            &format!("r{round}_{i}"),
                            &[
                                ColumnDef::new("id", TypeId::BigInt),
                                ColumnDef::new("note", TypeId::Varchar).nullable(),
                            ],
                        )?;
                    }
                    Ok(())
                })
                .unwrap();
            catalog
                .destroy_database_objects(DEFAULT_DATABASE_OID)
                .unwrap();
            round += 1;
        });
    });
}

criterion_group!(
    benches,
    bench_bootstrap,
    bench_oid_allocation,
    bench_oid_allocation_contended,
    bench_namespace_lookup,
    bench_relation_lookup,
    bench_create_and_destroy,
);
criterion_main!(benches);

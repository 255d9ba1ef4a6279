use super::support::*;

const THREADS: usize = 16;

#[test]
fn concurrent_first_access_synthesizes_once() {
    init_logging();
    let mapper = Mapper::default();
    let barrier = std::sync::Barrier::new(THREADS);

    let bundles: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    mapper.bundle::<Customer, CustomerRow>("admin").unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert_eq!(mapper.stats().bundle_syntheses, 1);
    assert!(bundles.iter().all(|bundle| Arc::ptr_eq(bundle, &bundles[0])));
}

#[test]
fn concurrent_failures_are_reported_once() {
    let mapper = Mapper::default();

    let failures: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| scope.spawn(|| mapper.bundle::<Customer, MistypedRow>("").err().unwrap().to_string()))
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert_eq!(mapper.stats().bundle_syntheses, 1);
    assert!(failures.iter().all(|message| message == &failures[0]));
}

#[test]
fn bundles_are_usable_across_threads() {
    let mapper = Mapper::default();
    let bundle = mapper.bundle::<Customer, CustomerRow>("").unwrap();

    let cities: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let bundle = Arc::clone(&bundle);
                scope.spawn(move || bundle.get_forward(&linz()).map(|row| row.city).unwrap_or_default())
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert!(cities.iter().all(|city| city == "Linz"));
}

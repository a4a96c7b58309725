use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::sync::Arc;

use tincan_store::{
    create_effect, create_feature_selector, create_reducer, create_selector, on, Action,
    ReducerDescriptor, State, Store,
};

#[derive(Clone, Debug)]
struct Counter {
    value: usize,
}

fn counter_reducer(key: String) -> ReducerDescriptor {
    create_reducer(
        key,
        Counter { value: 0 },
        [on(["increment"], |state: &Arc<Counter>, _| {
            Arc::new(Counter {
                value: state.value + 1,
            })
        })
        .expect("valid binding")],
    )
    .expect("valid reducer")
}

fn store_with_slices(count: usize) -> Store {
    let store = Store::default();
    store
        .register_reducers((0..count).map(|i| counter_reducer(format!("counter_{i}"))))
        .expect("unique keys");
    store
}

fn store_creation_benchmark(c: &mut Criterion) {
    let initial = State::new().with_slice("counter", Counter { value: 0 });

    c.bench_function("store_creation", |b| {
        b.iter(|| Store::new(black_box(&initial)));
    });
}

fn dispatch_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");

    for slice_count in [1, 10, 100].iter() {
        let store = store_with_slices(*slice_count);

        group.bench_with_input(
            BenchmarkId::new("changing", slice_count),
            slice_count,
            |b, _| {
                b.iter(|| store.dispatch(black_box(Action::new("increment"))));
            },
        );
        group.bench_with_input(BenchmarkId::new("no_op", slice_count), slice_count, |b, _| {
            b.iter(|| store.dispatch(black_box(Action::new("ignored"))));
        });
    }
    group.finish();
}

fn select_subscribers_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_subscribers");

    for subscriber_count in [1, 10, 100].iter() {
        let store = store_with_slices(1);
        let subscriptions: Vec<_> = (0..*subscriber_count)
            .map(|_| {
                store
                    .select(|state| state.get::<Counter>("counter_0").map(|c| c.value))
                    .subscribe(|value| {
                        black_box(value);
                    })
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(subscriber_count),
            subscriber_count,
            |b, _| {
                b.iter(|| store.dispatch(Action::new("increment")));
            },
        );

        for subscription in subscriptions {
            subscription.unsubscribe();
        }
    }
    group.finish();
}

fn memoized_selector_benchmark(c: &mut Criterion) {
    let state = State::new().with_slice("counter", Counter { value: 21 });
    let select_doubled = create_selector(
        (create_feature_selector::<Counter>("counter"),),
        |(counter,)| counter.as_ref().map_or(0, |c| c.value * 2),
    );

    c.bench_function("memoized_selector_hit", |b| {
        b.iter(|| black_box(select_doubled.select(black_box(&state))));
    });
}

fn effect_feedback_benchmark(c: &mut Criterion) {
    let store = store_with_slices(1);
    store.register_effects([create_effect(|actions| {
        actions.of_type(["request"]).map(|_| Action::new("increment"))
    })]);

    c.bench_function("effect_feedback", |b| {
        b.iter(|| store.dispatch(black_box(Action::new("request"))));
    });
}

criterion_group!(
    benches,
    store_creation_benchmark,
    dispatch_benchmark,
    select_subscribers_benchmark,
    memoized_selector_benchmark,
    effect_feedback_benchmark,
);
criterion_main!(benches);

//! Benchmarks for Global Code Motion.
//!
//! - A loop body holding a long chain of invariant arithmetic
//! - A sequence of diamonds where every value is consumed after the join
//! - Dominator and loop analysis alone, for comparison

extern crate gcmotion;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use gcmotion::prelude::*;
use std::hint::black_box;

/// One loop whose body computes `len` invariant values before updating the
/// induction variable.
fn invariant_chain(len: usize) -> SsaFunction {
    SsaFunctionBuilder::new(2).build_with(|f| {
        let (a, b) = (f.arg(0), f.arg(1));
        let i = f.var();
        let next = f.var();
        f.block(0, |bb| bb.jump(1));
        f.block(1, |bb| {
            bb.phi_into(i, &[(0, a), (2, next)]);
            let cond = bb.clt(i, b);
            bb.branch(cond, 2, 3);
        });
        f.block(2, |bb| {
            let mut acc = bb.mul(a, b);
            for _ in 0..len {
                acc = bb.add(acc, a);
            }
            bb.op(SsaOp::Add {
                dest: next,
                left: i,
                right: acc,
            });
            bb.jump(1);
        });
        f.block(3, |bb| bb.ret_val(i));
    })
}

/// `count` diamonds in a row; each head computes a value that is first read
/// by the next head.
fn diamond_chain(count: usize) -> SsaFunction {
    SsaFunctionBuilder::new(2).build_with(|f| {
        let (a, c) = (f.arg(0), f.arg(1));
        let mut carried = a;
        for k in 0..count {
            let head = 3 * k;
            let mut value = carried;
            f.block(head, |bb| {
                value = bb.add(carried, a);
                bb.branch(c, head + 1, head + 2);
            });
            f.block(head + 1, |bb| bb.jump(head + 3));
            f.block(head + 2, |bb| bb.jump(head + 3));
            carried = value;
        }
        let join = 3 * count;
        f.block(join, |bb| bb.ret_val(carried));
    })
}

fn bench_gcm_invariant_chain(c: &mut Criterion) {
    let ssa = invariant_chain(500);
    let (dominators, loops) = LoopAnalyzer::new(&ssa).analyze_all();
    let gcm = GlobalCodeMotion::new();

    c.bench_function("gcm_invariant_chain_500", |b| {
        b.iter_batched(
            || ssa.clone(),
            |mut ssa| {
                let stats = gcm.run(&mut ssa, &dominators, &loops).unwrap();
                black_box(stats)
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_gcm_diamond_chain(c: &mut Criterion) {
    let ssa = diamond_chain(200);
    let (dominators, loops) = LoopAnalyzer::new(&ssa).analyze_all();
    let gcm = GlobalCodeMotion::new();

    c.bench_function("gcm_diamond_chain_200", |b| {
        b.iter_batched(
            || ssa.clone(),
            |mut ssa| {
                let stats = gcm.run(&mut ssa, &dominators, &loops).unwrap();
                black_box(stats)
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_analysis_only(c: &mut Criterion) {
    let ssa = diamond_chain(200);

    c.bench_function("loop_analysis_diamond_chain_200", |b| {
        b.iter(|| {
            let result = LoopAnalyzer::new(black_box(&ssa)).analyze_all();
            black_box(result)
        });
    });
}

criterion_group!(
    benches,
    bench_gcm_invariant_chain,
    bench_gcm_diamond_chain,
    bench_analysis_only
);
criterion_main!(benches);

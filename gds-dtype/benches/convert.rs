#![allow(clippy::unwrap_used, clippy::cast_possible_truncation)]

use divan::Bencher;
use gds_dtype::convert::simd;
use gds_dtype::{CastFrom, cvt, cvt_sub};

fn main() {
    divan::main();
}

const LENS: &[usize] = &[1_000, 100_000];

fn words(len: usize) -> Vec<i32> {
    (0..len).map(|i| (i as i32).wrapping_mul(2_654_435)).collect()
}

#[divan::bench(args = LENS)]
fn narrow_i32_u8(bencher: Bencher, len: usize) {
    let src = words(len);
    let mut dst = vec![0u8; len];
    bencher.bench_local(|| cvt(&mut dst, &src));
}

#[divan::bench(args = LENS)]
fn narrow_i32_u8_scalar(bencher: Bencher, len: usize) {
    let src = words(len);
    let mut dst = vec![0u8; len];
    bencher.bench_local(|| simd::scalar::narrow(&mut dst, &src));
}

#[divan::bench(args = LENS)]
fn narrow_i32_i8_selected(bencher: Bencher, len: usize) {
    let src = words(len);
    let sel: Vec<bool> = (0..len).map(|i| i % 4 != 0).collect();
    let mut dst = vec![0i8; len];
    bencher.bench_local(|| cvt_sub(&mut dst, &src, &sel));
}

#[divan::bench(args = LENS)]
fn widen_i16_f64(bencher: Bencher, len: usize) {
    let src: Vec<i16> = (0..len).map(|i| i as i16).collect();
    let mut dst = vec![0f64; len];
    bencher.bench_local(|| f64::cast_slice(&mut dst, &src));
}

#[divan::bench(args = LENS)]
fn format_i32_utf8(bencher: Bencher, len: usize) {
    let src = words(len);
    let mut dst = vec![String::new(); len];
    bencher.bench_local(|| cvt(&mut dst, &src));
}

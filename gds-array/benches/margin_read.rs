#![allow(clippy::unwrap_used)]

use divan::Bencher;
use gds_array::{AbstractArray, ArrayRead, ArrayReadOptions, Int32Array};
use gds_dtype::{InBuffer, SVType, ValueVec};

fn main() {
    divan::main();
}

const ROWS: i32 = 512;
const COLS: i32 = 256;

fn matrix() -> Int32Array {
    let mut array = Int32Array::memory(&[ROWS, COLS]).unwrap();
    let values: Vec<i32> = (0..ROWS * COLS).collect();
    array.write_data(None, None, InBuffer::from(&values)).unwrap();
    array
}

fn read_columns(array: &mut Int32Array, options: ArrayReadOptions) -> usize {
    let mut reader = ArrayRead::new(array, 1, SVType::F64, None, options).unwrap();
    let mut column = ValueVec::new(SVType::F64, reader.margin_count()).unwrap();
    let mut n = 0;
    while !reader.eof() {
        n += reader.read(column.as_out()).unwrap();
    }
    n
}

#[divan::bench]
fn columns_unbuffered(bencher: Bencher) {
    let mut array = matrix();
    let options = ArrayReadOptions::default().with_buffer_if_needed(false);
    bencher.bench_local(|| read_columns(&mut array, options));
}

#[divan::bench(args = [1 << 14, 1 << 18, 1 << 22])]
fn columns_buffered(bencher: Bencher, budget: u64) {
    let mut array = matrix();
    let options = ArrayReadOptions::default().with_buffer_size(budget);
    bencher.bench_local(|| read_columns(&mut array, options));
}

#[divan::bench]
fn rows(bencher: Bencher) {
    let mut array = matrix();
    bencher.bench_local(|| {
        let mut reader =
            ArrayRead::new(&mut array, 0, SVType::I32, None, ArrayReadOptions::default()).unwrap();
        let mut n = 0;
        while !reader.eof() {
            n += reader.read_values().unwrap().len();
        }
        n
    });
}

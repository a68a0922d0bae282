use gds::dtype::{InBuffer, OutBuffer, SVType};
use gds::{
    AbstractArray, ArrayRead, ArrayReadOptions, Float64Array, Int16Array, UInt8Array,
    balance_array_read_buffer,
};

fn genotypes(samples: i32, variants: i32) -> UInt8Array {
    let mut array = UInt8Array::memory(&[samples, variants]).unwrap();
    let values: Vec<u8> = (0..samples * variants)
        .map(|i| u8::try_from(i % 3).unwrap())
        .collect();
    array.write_data(None, None, InBuffer::from(&values)).unwrap();
    array
}

fn read_all(reader: &mut ArrayRead<'_>) -> Vec<Vec<i32>> {
    let mut slices = Vec::new();
    while !reader.eof() {
        let values = reader.read_values().unwrap();
        slices.push(values.as_slice::<i32>().unwrap().to_vec());
    }
    slices
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, None)]
    #[case(1, None)]
    #[case(1, Some(1))]
    #[case(1, Some(50))]
    #[case(0, Some(1 << 20))]
    fn buffered_reads_match_direct_reads(#[case] margin: usize, #[case] budget: Option<u64>) {
        let mut direct_array = genotypes(6, 9);
        let mut buffered_array = genotypes(6, 9);
        let samples = [true, true, false, true, false, true];

        let selection = [Some(&samples[..]), None];
        let mut direct = ArrayRead::new(
            &mut direct_array,
            margin,
            SVType::I32,
            Some(&selection),
            ArrayReadOptions::default().with_buffer_if_needed(false),
        )
        .unwrap();
        assert_eq!(direct.buffer_slices(), 0);

        let options = match budget {
            Some(budget) => ArrayReadOptions::default().with_buffer_size(budget),
            None => ArrayReadOptions::default(),
        };
        let mut buffered = ArrayRead::new(
            &mut buffered_array,
            margin,
            SVType::I32,
            Some(&selection),
            options,
        )
        .unwrap();

        assert_eq!(direct.count(), buffered.count());
        assert_eq!(direct.margin_count(), buffered.margin_count());
        assert_eq!(read_all(&mut direct), read_all(&mut buffered));
    }

    #[test]
    fn column_slices_hold_selected_samples() {
        let mut array = Int16Array::memory(&[3, 4]).unwrap();
        array
            .write_data(None, None, InBuffer::from(&(0..12i16).collect::<Vec<_>>()))
            .unwrap();
        let rows = [true, false, true];
        let cols = [false, true, true, false];
        let selection = [Some(&rows[..]), Some(&cols[..])];
        let mut reader = ArrayRead::new(
            &mut array,
            1,
            SVType::F64,
            Some(&selection),
            ArrayReadOptions::default(),
        )
        .unwrap();
        assert_eq!(reader.dim_cnt_valid(), &[2, 2]);
        assert_eq!(reader.margin_index(), Some(1));

        let mut out = [0f64; 2];
        assert_eq!(reader.read(OutBuffer::from(&mut out)).unwrap(), 2);
        assert_eq!(out, [1.0, 9.0]);
        assert_eq!(reader.margin_index(), Some(2));
        reader.read(OutBuffer::from(&mut out)).unwrap();
        assert_eq!(out, [2.0, 10.0]);
        assert!(reader.eof());
        assert_eq!(reader.margin_index(), None);
    }

    #[rstest]
    #[case(1000)]
    #[case(333)]
    #[case(64)]
    fn balanced_readers_share_one_budget(#[case] budget: u64) {
        let mut small = UInt8Array::memory(&[8, 20]).unwrap();
        let mut wide = Float64Array::memory(&[8, 20]).unwrap();
        let options = ArrayReadOptions::default().with_buffer_if_needed(false);
        let mut readers = vec![
            ArrayRead::new(&mut small, 0, SVType::U8, None, options).unwrap(),
            ArrayRead::new(&mut wide, 0, SVType::F64, None, options).unwrap(),
        ];
        balance_array_read_buffer(&mut readers, Some(budget)).unwrap();

        let margin_total: u64 = readers.iter().map(|r| r.margin_size() as u64).sum();
        let used: u64 = readers.iter().map(ArrayRead::buffer_size).sum();
        assert!(used <= budget);
        for reader in &readers {
            assert_eq!(reader.buffer_slices(), readers[0].buffer_slices());
            assert_eq!(reader.buffer_slices() == 0, budget < margin_total);
        }
    }

    #[test]
    fn balanced_readers_advance_together() {
        let mut a = genotypes(4, 10);
        let mut b = Float64Array::memory(&[4, 10]).unwrap();
        b.write_data(None, None, InBuffer::from(&vec![0.5f64; 40])).unwrap();
        let mut readers = vec![
            ArrayRead::new(&mut a, 0, SVType::I32, None, ArrayReadOptions::default()).unwrap(),
            ArrayRead::new(&mut b, 0, SVType::I32, None, ArrayReadOptions::default()).unwrap(),
        ];
        balance_array_read_buffer(&mut readers, Some(200)).unwrap();

        let mut rows = 0;
        while !readers[0].eof() {
            for reader in &mut readers {
                assert_eq!(reader.read_values().unwrap().len(), 10);
            }
            rows += 1;
        }
        assert_eq!(rows, 4);
        assert!(readers[1].eof());
    }
}

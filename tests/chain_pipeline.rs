use cowichan_chain::collective::{collect, replicate};
use cowichan_chain::randmat::{generate_row, randmat};
use cowichan_chain::{
    launch_local, run_chain, ChainError, DistributedVector, PipelineParameters, ROOT_PE,
};

fn params(nelts: u32, seed: u32, thresh_percent: u32, winnow_nelts: u32) -> PipelineParameters {
    PipelineParameters {
        nelts,
        seed,
        thresh_percent,
        winnow_nelts,
    }
}

fn root_result(num_pes: usize, params: PipelineParameters) -> (Vec<u32>, Vec<f64>) {
    let runs = launch_local(num_pes, |group| run_chain(group, || Ok(params))).unwrap();
    for run in &runs[1..] {
        assert_eq!(run.selection, runs[0].selection);
        assert!(run.result.is_none());
    }
    let root = &runs[0];
    (root.selection.clone(), root.result.clone().unwrap())
}

#[test]
fn matrix_is_independent_of_group_size() {
    let (nrows, ncols, seed) = (10, 7, 5);
    let serial = (0..nrows)
        .flat_map(|row| generate_row(row, seed, ncols))
        .collect::<Vec<_>>();

    for num_pes in [1, 2, 4, 8] {
        let gathered = launch_local(num_pes, |group| {
            let matrix = randmat(group, nrows, ncols, seed);
            let mut cells = vec![0u32; if group.is_root() { nrows * ncols } else { 0 }];
            collect(group, &matrix, &mut cells, ROOT_PE)?;
            Ok(cells)
        })
        .unwrap();
        assert_eq!(gathered[0], serial, "num_pes = {num_pes}");
    }
}

#[test]
fn half_threshold_selects_leading_cells() {
    for num_pes in [1, 2, 3, 8] {
        let (selection, result) = root_result(num_pes, params(4, 2, 50, 3));
        assert_eq!(selection, vec![73, 72, 79]);
        assert_eq!(result, vec![1860.0, 2138.0, 2601.0]);
    }
}

#[test]
fn quarter_threshold_selection_spans_rows() {
    for num_pes in [1, 2, 4] {
        let (selection, result) = root_result(num_pes, params(4, 2, 25, 5));
        assert_eq!(selection, vec![79, 98, 77, 82, 87]);
        assert_eq!(result, vec![10463.0, 15677.0, 11581.0, 9185.0, 7675.0]);
    }
}

#[test]
fn parameters_read_from_text() {
    let runs = launch_local(2, |group| {
        run_chain(group, || PipelineParameters::parse("4 2 50 3\n"))
    })
    .unwrap();
    assert_eq!(runs[1].params, params(4, 2, 50, 3));
    assert_eq!(runs[0].result.as_deref(), Some(&[1860.0, 2138.0, 2601.0][..]));
}

#[test]
fn too_few_qualifying_cells_fails_everywhere() {
    for num_pes in [1, 3] {
        let err = launch_local(num_pes, |group| run_chain(group, || Ok(params(4, 2, 10, 3))))
            .unwrap_err();
        assert_eq!(
            err,
            ChainError::InsufficientSelection {
                requested: 3,
                available: 2
            }
        );
        assert_eq!(err.exit_code(), 1);
    }
}

#[test]
fn invalid_parameters_are_configuration_errors() {
    let err = launch_local(2, |group| run_chain(group, || Ok(params(4, 2, 150, 3)))).unwrap_err();
    assert!(matches!(err, ChainError::Configuration(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn replicated_vectors_arrive_intact() {
    for len in [1usize, 64, 37] {
        for num_pes in [1, 2, 3, 5] {
            let copies = launch_local(num_pes, |group| {
                let mut vector = DistributedVector::<u64>::new(group, len);
                let range = vector.local_range();
                for (slot, index) in vector.local_data_mut().iter_mut().zip(range) {
                    *slot = (index as u64) * 3 + 1;
                }
                replicate(group, &vector, ROOT_PE)
            })
            .unwrap();
            let expected = (0..len as u64).map(|i| i * 3 + 1).collect::<Vec<_>>();
            assert!(copies.iter().all(|copy| *copy == expected), "len {len}, pes {num_pes}");
        }
    }
}

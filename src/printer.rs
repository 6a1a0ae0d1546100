use crate::params::PipelineParameters;

use std::time::Duration;

pub const ENGINE_TAG: &str = "RUST";
pub const PROBLEM_TAG: &str = "Chain";

/// `engine, problem, rows, cols, thresh, winnow_nelts, pes, seconds, bench flag`
pub fn report_line(
    params: &PipelineParameters,
    num_pes: usize,
    elapsed: Duration,
    is_bench: bool,
) -> String {
    format!(
        "{ENGINE_TAG:<6},{PROBLEM_TAG:<7},{:>5},{:>5},{:>3},{:>5},{:>2},{:.9},isBench:{}",
        params.nelts,
        params.nelts,
        params.thresh_percent,
        params.winnow_nelts,
        num_pes,
        elapsed.as_secs_f64(),
        u8::from(is_bench),
    )
}

pub fn result_line(result: &[f64]) -> String {
    result
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn print_report(
    my_pe: usize,
    params: &PipelineParameters,
    num_pes: usize,
    elapsed: Duration,
    is_bench: bool,
    result: Option<&[f64]>,
) {
    if my_pe == 0 {
        println!("{}", report_line(params, num_pes, elapsed, is_bench));
        if let (false, Some(result)) = (is_bench, result) {
            println!("{}", result_line(result));
        }
    }
}

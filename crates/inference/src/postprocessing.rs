/// Best-scoring class of one prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub class_index: usize,
    pub class_name: String,
    /// Raw model score for `class_index`
    pub score: f32,
}

impl Prediction {
    /// Score as a percentage with exactly two decimal places, e.g. `"85.67"`.
    pub fn confidence(&self) -> String {
        format_confidence(self.score)
    }
}

/// Index of the largest score.
///
/// Ties resolve to the lowest index and NaN never wins. Returns `None` for an
/// empty vector or one made only of NaN.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;

    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((i, score)),
        }
    }

    best.map(|(i, _)| i)
}

/// `score * 100` with two decimals. Exact ties round away from zero
/// (`0.03125 -> "3.13"`) rather than to even.
pub fn format_confidence(score: f32) -> String {
    // Exact in f64 for any f32 score, so the tie check below is exact too
    let percent = score as f64 * 100.0;
    format!("{:.2}", (percent * 100.0).round() / 100.0)
}

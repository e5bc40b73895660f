//! Pure view model derived from the submission state.

use crate::submission::SubmissionState;

/// Visual treatment of a verdict panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Something was detected: red panel, warning icon.
    Alarm,
    /// Negative finding: green panel, check icon.
    Clear,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerdictView {
    pub tone: Tone,
    pub headline: &'static str,
    pub details: String,
    /// Formatted confidence, e.g. `Confidence: 87.0%`.
    pub confidence_line: String,
}

/// What the result area should show for a given state.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    Nothing,
    Progress,
    /// Embedded in the page.
    Verdict(VerdictView),
    /// Interruptive alert; must be dismissed by the user.
    Alert(String),
}

pub fn render(state: &SubmissionState) -> ResultView {
    match state {
        SubmissionState::Idle => ResultView::Nothing,
        SubmissionState::InFlight => ResultView::Progress,
        SubmissionState::Succeeded(result) => {
            let (tone, headline) = if result.cancer_detected {
                (Tone::Alarm, "Cancer Detected")
            } else {
                (Tone::Clear, "No Cancer Detected")
            };
            ResultView::Verdict(VerdictView {
                tone,
                headline,
                details: result.details.clone(),
                confidence_line: format!("Confidence: {}", format_confidence(result.confidence)),
            })
        }
        SubmissionState::Failed(message) => ResultView::Alert(message.clone()),
    }
}

/// Percentage with one decimal. Values outside [0,1] are clamped and
/// non-finite values render as `--`.
pub fn format_confidence(confidence: f64) -> String {
    if !confidence.is_finite() {
        return "--".to_string();
    }
    format!("{:.1}%", confidence.clamp(0.0, 1.0) * 100.0)
}

/// File size in megabytes with two decimals.
pub fn format_size_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use crate::submission::AnalysisResult;
    use rstest::rstest;

    #[rstest]
    #[case(0.87, "87.0%")]
    #[case(0.0, "0.0%")]
    #[case(1.0, "100.0%")]
    #[case(0.1234, "12.3%")]
    #[case(3.5, "100.0%")]
    #[case(-1.0, "0.0%")]
    #[case(f64::NAN, "--")]
    #[case(f64::INFINITY, "--")]
    fn confidence_formatting(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_confidence(value), expected);
    }

    #[rstest]
    #[case(2 * 1024 * 1024, "2.00 MB")]
    #[case(0, "0.00 MB")]
    #[case(1536 * 1024, "1.50 MB")]
    fn size_formatting(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(format_size_mb(bytes), expected);
    }

    #[test]
    fn idle_and_in_flight() {
        assert_eq!(render(&SubmissionState::Idle), ResultView::Nothing);
        assert_eq!(render(&SubmissionState::InFlight), ResultView::Progress);
    }

    #[test]
    fn success_is_embedded_and_failure_interrupts() {
        let category = Category::new("oral", "Oral Cancer", "", "yellow");
        let ok = SubmissionState::Succeeded(AnalysisResult::new(&category, false, 0.31));
        match render(&ok) {
            ResultView::Verdict(view) => {
                assert_eq!(view.tone, Tone::Clear);
                assert_eq!(view.headline, "No Cancer Detected");
                assert_eq!(view.details, "No cancer detected.");
                assert_eq!(view.confidence_line, "Confidence: 31.0%");
            }
            other => panic!("expected verdict, got {other:?}"),
        }
        let failed = SubmissionState::Failed("model unavailable".into());
        assert_eq!(render(&failed), ResultView::Alert("model unavailable".into()));
    }

    #[test]
    fn hand_built_out_of_range_result_still_renders() {
        let category = Category::new("oral", "Oral Cancer", "", "yellow");
        let mut result = AnalysisResult::new(&category, true, 0.5);
        result.confidence = 42.0;
        let ResultView::Verdict(view) = render(&SubmissionState::Succeeded(result)) else {
            panic!("expected verdict");
        };
        assert_eq!(view.tone, Tone::Alarm);
        assert_eq!(view.confidence_line, "Confidence: 100.0%");
    }
}

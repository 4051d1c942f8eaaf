use plotly::layout::{Axis, BarMode, Layout};
use plotly::{Histogram, Plot};

/// Plot a histogram of churn probabilities for the churn and non-churn rows
pub fn plot_probability_histogram(probabilities: &[f64], labels: &[i32], title: &str) -> Plot {
    assert_eq!(
        probabilities.len(),
        labels.len(),
        "Probabilities and labels must have the same length"
    );

    let mut churned = Vec::new();
    let mut retained = Vec::new();

    for (p, label) in probabilities.iter().zip(labels) {
        if *label == 1 {
            churned.push(*p);
        } else {
            retained.push(*p);
        }
    }

    let trace_churn = Histogram::new(churned).name("Churn").opacity(0.6);
    let trace_retained = Histogram::new(retained).name("No Churn").opacity(0.6);

    let layout = Layout::new()
        .title(title)
        .bar_mode(BarMode::Overlay)
        .x_axis(Axis::new().title("Churn probability"))
        .y_axis(Axis::new().title("Count"));

    let mut plot = Plot::new();
    plot.add_trace(trace_churn);
    plot.add_trace(trace_retained);
    plot.set_layout(layout);

    plot
}

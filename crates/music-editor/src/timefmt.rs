/// Formats seconds as `MM:SS`. Unknown or negative times show `00:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00".to_string();
    }
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{mins:02}:{secs:02}")
}

/// Tick positions (seconds) for the timeline ruler, ending with `duration`.
///
/// Tracks between 150 s and 420 s get a tick every 30 s; anything else is
/// split into eight equal steps.
pub fn ruler_ticks(duration: f64) -> Vec<f64> {
    if !duration.is_finite() || duration <= 0.0 {
        return vec![0.0];
    }
    let mut ticks: Vec<f64> = if duration > 150.0 && duration < 420.0 {
        let count = (duration / 30.0).round() as usize;
        (0..count).map(|i| i as f64 * 30.0).collect()
    } else {
        (0..8).map(|i| f64::from(i) * duration / 8.0).collect()
    };
    ticks.push(duration);
    ticks
}

use analysis_core::IndicatorReading;

/// Composite score plus the drivers that explain it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScoreCard {
    pub score: i32,
    pub drivers: Vec<String>,
}

/// Sum point contributions and collect driver text, preserving reading order.
pub fn aggregate(readings: &[IndicatorReading]) -> ScoreCard {
    readings.iter().fold(ScoreCard::default(), |mut card, reading| {
        card.score += reading.points;
        if let Some(driver) = &reading.driver {
            card.drivers.push(driver.clone());
        }
        card
    })
}

/// Point-in-time quote for the tracked ticker.
///
/// Every numeric field is optional: the upstream API omits fields freely
/// (pre-open, thinly traded symbols) and an absent value is rendered as
/// "N/A" rather than treated as an error.
#[derive(Debug, Clone, Default)]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub currency: Option<String>,
    pub price: Option<f64>,
    pub open: Option<f64>,
    pub previous_close: Option<f64>,
    pub day_low: Option<f64>,
    pub day_high: Option<f64>,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
}

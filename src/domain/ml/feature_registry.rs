use sha2::{Digest, Sha256};

/// Number of trailing trading days fed to the classifier.
pub const WINDOW_SIZE: usize = 60;

/// Number of feature columns per trading day.
pub const FEATURE_COUNT: usize = 47;

/// Flattened classifier input width (window-then-feature order).
pub const FLAT_INPUT_LEN: usize = WINDOW_SIZE * FEATURE_COUNT;

/// Days ahead the classifier predicts the direction for.
pub const HORIZON_DAYS: usize = 7;

/// Ordered list of feature names.
/// This order MUST match exactly with the column order the scaler and
/// classifier were fit on. Any change here is a breaking change for models.
pub const FEATURE_COLS: [&str; FEATURE_COUNT] = [
    // Raw bar (6)
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "OI",
    // Moving averages (9)
    "SMA_5",
    "SMA_10",
    "SMA_20",
    "SMA_50",
    "EMA_12",
    "EMA_26",
    "MACD",
    "MACD_Signal",
    "MACD_Hist",
    // RSI & Bollinger (4)
    "RSI",
    "BB_Middle",
    "BB_Upper",
    "BB_Lower",
    // Volume (2)
    "Volume_SMA_20",
    "Volume_Ratio",
    // Price based (11)
    "Daily_Return",
    "Price_Range",
    "Price_Change",
    "Return_3d",
    "Return_5d",
    "Return_10d",
    "Log_Return",
    "Volatility_5d",
    "Volatility_20d",
    "Momentum_10d",
    "Momentum_20d",
    // Market context (3)
    "relative_strength_to_nifty50",
    "correlation_to_nifty50_20d",
    "market_regime",
    // Momentum & mean reversion (6)
    "rsi_divergence",
    "macd_crossover_signal",
    "bb_squeeze",
    "price_vs_sma50_pct",
    "momentum_strength",
    "support_resistance_distance",
    // Volume & liquidity (3)
    "volume_price_trend",
    "on_balance_volume",
    "volume_breakout",
    // Statistical (3)
    "returns_skewness_20d",
    "returns_kurtosis_20d",
    "hurst_exponent",
];

/// Raw bar fields plus the basic indicators.
pub const BASIC_FEATURE_COUNT: usize = 32;

static FEATURE_ORDER: [Feature; FEATURE_COUNT] = Feature::ALL;

/// Typed handle for a feature column. Discriminants are positions in
/// [`FEATURE_COLS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum Feature {
    Open,
    High,
    Low,
    Close,
    Volume,
    OpenInterest,
    Sma5,
    Sma10,
    Sma20,
    Sma50,
    Ema12,
    Ema26,
    Macd,
    MacdSignal,
    MacdHist,
    Rsi,
    BbMiddle,
    BbUpper,
    BbLower,
    VolumeSma20,
    VolumeRatio,
    DailyReturn,
    PriceRange,
    PriceChange,
    Return3d,
    Return5d,
    Return10d,
    LogReturn,
    Volatility5d,
    Volatility20d,
    Momentum10d,
    Momentum20d,
    RelativeStrength,
    Correlation20d,
    MarketRegime,
    RsiDivergence,
    MacdCrossover,
    BbSqueeze,
    PriceVsSma50Pct,
    MomentumStrength,
    SupportResistanceDistance,
    VolumePriceTrend,
    OnBalanceVolume,
    VolumeBreakout,
    ReturnsSkewness20d,
    ReturnsKurtosis20d,
    HurstExponent,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Open,
        Feature::High,
        Feature::Low,
        Feature::Close,
        Feature::Volume,
        Feature::OpenInterest,
        Feature::Sma5,
        Feature::Sma10,
        Feature::Sma20,
        Feature::Sma50,
        Feature::Ema12,
        Feature::Ema26,
        Feature::Macd,
        Feature::MacdSignal,
        Feature::MacdHist,
        Feature::Rsi,
        Feature::BbMiddle,
        Feature::BbUpper,
        Feature::BbLower,
        Feature::VolumeSma20,
        Feature::VolumeRatio,
        Feature::DailyReturn,
        Feature::PriceRange,
        Feature::PriceChange,
        Feature::Return3d,
        Feature::Return5d,
        Feature::Return10d,
        Feature::LogReturn,
        Feature::Volatility5d,
        Feature::Volatility20d,
        Feature::Momentum10d,
        Feature::Momentum20d,
        Feature::RelativeStrength,
        Feature::Correlation20d,
        Feature::MarketRegime,
        Feature::RsiDivergence,
        Feature::MacdCrossover,
        Feature::BbSqueeze,
        Feature::PriceVsSma50Pct,
        Feature::MomentumStrength,
        Feature::SupportResistanceDistance,
        Feature::VolumePriceTrend,
        Feature::OnBalanceVolume,
        Feature::VolumeBreakout,
        Feature::ReturnsSkewness20d,
        Feature::ReturnsKurtosis20d,
        Feature::HurstExponent,
    ];

    /// Columns produced by the basic indicator engine (raw bar fields included).
    pub fn basic() -> &'static [Feature] {
        &FEATURE_ORDER[..BASIC_FEATURE_COUNT]
    }

    /// Columns produced by the advanced indicator engine.
    pub fn advanced() -> &'static [Feature] {
        &FEATURE_ORDER[BASIC_FEATURE_COUNT..]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        FEATURE_COLS[self.index()]
    }

    pub fn from_name(name: &str) -> Option<Feature> {
        FEATURE_COLS
            .iter()
            .position(|n| *n == name)
            .map(|i| Feature::ALL[i])
    }
}

/// SHA-256 over the comma-joined column order, hex encoded.
/// Logged when artifacts are loaded so a model/schema mismatch is traceable.
pub fn feature_schema_fingerprint() -> String {
    let mut hasher = Sha256::new();
    hasher.update(FEATURE_COLS.join(",").as_bytes());
    hex::encode(hasher.finalize())
}

//! Plain data row types produced by the recorders.

/// One arrival's end-of-life record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EndRow {
    pub name:          String,
    /// Time of the arrival's first run; `-1.0` if it never ran.
    pub start_time:    f64,
    pub end_time:      f64,
    /// Service time actually accumulated (waiting excluded).
    pub activity_time: f64,
    /// `false` for forced or voluntary departures before the chain's end.
    pub finished:      bool,
}

/// One resource release.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReleaseRow {
    pub name:          String,
    pub start_time:    f64,
    pub end_time:      f64,
    pub activity_time: f64,
    pub resource:      String,
}

/// One attribute write on a monitored arrival.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeRow {
    pub time:  f64,
    pub name:  String,
    pub key:   String,
    pub value: f64,
}

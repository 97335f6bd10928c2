// src/services/indices.rs
use crate::models::{IndexDescriptor, YearMonth};

/// The ten indices covered by the report (mock-data symbols).
pub fn default_indices() -> Vec<IndexDescriptor> {
    vec![
        IndexDescriptor::new("SPX", "S&P 500", "United States"),
        IndexDescriptor::new("DJIA", "Dow Jones Industrial Average", "United States"),
        IndexDescriptor::new("COMP", "NASDAQ Composite", "United States"),
        IndexDescriptor::new("FTSE", "FTSE 100", "United Kingdom"),
        IndexDescriptor::new("DAX", "DAX", "Germany"),
        IndexDescriptor::new("CAC", "CAC 40", "France"),
        IndexDescriptor::new("N225", "Nikkei 225", "Japan"),
        IndexDescriptor::new("HSI", "Hang Seng Index", "Hong Kong"),
        IndexDescriptor::new("SSEC", "Shanghai Composite", "China"),
        IndexDescriptor::new("BSESN", "BSE SENSEX", "India"),
    ]
}

/// Monthly window a synthesized series covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisWindow {
    pub start_year: i32,
    pub years: u32,
}

impl Default for SynthesisWindow {
    fn default() -> Self {
        SynthesisWindow {
            start_year: 2013,
            years: 10,
        }
    }
}

impl SynthesisWindow {
    pub fn months(&self) -> usize {
        self.years as usize * 12
    }

    pub fn first_month(&self) -> Option<YearMonth> {
        YearMonth::new(self.start_year, 1)
    }

    pub fn last_month(&self) -> Option<YearMonth> {
        YearMonth::new(self.start_year + self.years as i32 - 1, 12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_2013_through_2022() {
        let window = SynthesisWindow::default();
        assert_eq!(window.months(), 120);
        assert_eq!(window.first_month().unwrap().to_string(), "2013-01");
        assert_eq!(window.last_month().unwrap().to_string(), "2022-12");
    }

    #[test]
    fn ten_unique_symbols() {
        let indices = default_indices();
        assert_eq!(indices.len(), 10);
        let mut symbols: Vec<_> = indices.iter().map(|i| i.symbol.clone()).collect();
        symbols.sort();
        symbols.dedup();
        assert_eq!(symbols.len(), 10);
    }
}

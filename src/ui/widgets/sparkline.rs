//! Price sparkline widget for inline visualization

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Block characters for different price levels (8 levels)
const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// A one-row sparkline scaled between the series minimum and maximum
pub struct PriceSparkline<'a> {
    /// Prices in chronological order
    prices: &'a [f64],
    /// Lowest price in the series
    low: f64,
    /// Highest price in the series
    high: f64,
    /// Style for the sparkline
    style: Style,
}

impl<'a> PriceSparkline<'a> {
    pub fn new(prices: &'a [f64]) -> Self {
        let (low, high) = prices
            .iter()
            .copied()
            .filter(|p| p.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p), hi.max(p))
            });
        Self {
            prices,
            low,
            high,
            style: Style::default().fg(Color::Cyan),
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    fn price_to_block(&self, price: f64) -> char {
        let range = self.high - self.low;
        if !range.is_finite() || range <= 0.0 {
            // Flat series
            return BLOCKS[3];
        }
        let normalized = ((price - self.low) / range).clamp(0.0, 1.0);
        let index = ((normalized * 7.0).round() as usize).min(7);
        BLOCKS[index]
    }

    /// Picks `width` evenly spaced points from the series
    fn sample(&self, width: usize) -> Vec<f64> {
        let len = self.prices.len();
        if len <= width {
            return self.prices.to_vec();
        }
        (0..width).map(|i| self.prices[i * len / width]).collect()
    }
}

impl<'a> Widget for PriceSparkline<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        for (i, price) in self.sample(area.width as usize).into_iter().enumerate() {
            let block = self.price_to_block(price);
            let x = area.x + i as u16;
            let y = area.y;

            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_char(block).set_style(self.style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_to_block_uses_series_bounds() {
        let prices = [100.0, 150.0, 200.0];
        let sparkline = PriceSparkline::new(&prices);
        assert_eq!(sparkline.price_to_block(100.0), '▁');
        assert_eq!(sparkline.price_to_block(200.0), '█');
    }

    #[test]
    fn test_price_to_block_mid() {
        let prices = [0.0, 10.0];
        let sparkline = PriceSparkline::new(&prices);
        let block = sparkline.price_to_block(5.0); // 50%
        assert!(BLOCKS[3..=4].contains(&block));
    }

    #[test]
    fn test_flat_series_renders_middle_block() {
        let prices = [5.0, 5.0, 5.0];
        let sparkline = PriceSparkline::new(&prices);
        assert_eq!(sparkline.price_to_block(5.0), '▄');
    }

    #[test]
    fn test_sample_downsamples_to_width() {
        let prices: Vec<f64> = (0..100).map(f64::from).collect();
        let sparkline = PriceSparkline::new(&prices);

        let sampled = sparkline.sample(10);

        assert_eq!(sampled.len(), 10);
        assert_eq!(sampled[0], 0.0);
        assert_eq!(sampled[9], 90.0);
    }

    #[test]
    fn test_render_fills_one_cell_per_point() {
        let prices = [1.0, 2.0, 3.0];
        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);

        PriceSparkline::new(&prices).render(area, &mut buf);

        assert_eq!(buf.cell((0, 0)).unwrap().symbol(), "▁");
        assert_eq!(buf.cell((2, 0)).unwrap().symbol(), "█");
        assert_eq!(buf.cell((3, 0)).unwrap().symbol(), " ");
    }

    #[test]
    fn test_empty_series_renders_nothing() {
        let area = Rect::new(0, 0, 5, 1);
        let mut buf = Buffer::empty(area);

        PriceSparkline::new(&[]).render(area, &mut buf);

        assert!(buf.content().iter().all(|cell| cell.symbol() == " "));
    }
}

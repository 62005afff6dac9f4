//! Horizontal scrolling for footer text that does not fit its area

/// Blank space between the end of the text and its repeated copy
pub const TICKER_GAP_PX: u32 = 24;

/// Distance scrolled per footer tick
pub const TICKER_STEP_PX: u32 = 2;

/// Where to draw the text, relative to the left edge of the ticker area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerPlacement {
    /// Text fits; drawn once and never scrolled
    Fixed,
    /// Text scrolls; drawn at both x positions so the wrap is seamless
    Scrolling { first_x: i32, second_x: i32 },
}

/// Placement of text `text_width` wide in an area `area_width` wide, scrolled
/// by `offset` pixels.
pub fn placement(text_width: u32, area_width: u32, offset: u32) -> TickerPlacement {
    if text_width <= area_width {
        return TickerPlacement::Fixed;
    }
    let period = text_width + TICKER_GAP_PX;
    let offset = (offset % period) as i32;
    TickerPlacement::Scrolling {
        first_x: -offset,
        second_x: -offset + period as i32,
    }
}

/// Offset after one footer tick. Text that fits stays pinned at zero.
pub fn advance(text_width: u32, area_width: u32, offset: u32) -> u32 {
    if text_width <= area_width {
        return 0;
    }
    (offset + TICKER_STEP_PX) % (text_width + TICKER_GAP_PX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fitting_text_is_pinned() {
        assert_eq!(placement(100, 265, 40), TickerPlacement::Fixed);
        assert_eq!(placement(265, 265, 0), TickerPlacement::Fixed);
        assert_eq!(advance(265, 265, 40), 0);
    }

    #[test]
    fn test_wide_text_draws_two_copies() {
        assert_eq!(
            placement(400, 265, 10),
            TickerPlacement::Scrolling {
                first_x: -10,
                second_x: 414,
            }
        );
    }

    #[test]
    fn test_placement_is_periodic() {
        let width = 401;
        let period = width + TICKER_GAP_PX;
        for offset in 0..period {
            let placed = placement(width, 265, offset);
            assert_eq!(placed, placement(width, 265, offset + period));
            assert_eq!(placed, placement(width, 265, offset + 3 * period));
            match placed {
                TickerPlacement::Scrolling { first_x, second_x } => {
                    assert_eq!(second_x - first_x, period as i32);
                    assert_eq!(first_x, -(offset as i32));
                }
                TickerPlacement::Fixed => panic!("wide text must scroll"),
            }
        }
    }

    #[test]
    fn test_offset_wraps_at_period() {
        let width = 401;
        let period = width + TICKER_GAP_PX;
        let mut offset = 0;
        for _ in 0..period {
            offset = advance(width, 265, offset);
            assert!(offset < period);
        }
        // An odd period visits every offset before returning to zero
        assert_eq!(offset, 0);
        assert_eq!(advance(width, 265, period - 1), 1);
    }
}

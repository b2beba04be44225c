//! Proportional widths for rows of images.
//!
//! Images that share a row are shown at a common height. Each image's share
//! of the row width is therefore proportional to its width at that height.
//! The shares are kept as small integers so that rows with the same
//! proportions, whatever their pixel sizes, produce the same CSS class and
//! reuse one rule in the generated stylesheet.
//!
//! ```text
//! [(100,100), (200,100)]  →  scale1-3-2, scale2-3-2
//! [(300,300), (600,300)]  →  scale1-3-2, scale2-3-2
//! ```
//!
//! All functions here are pure; [`LayoutRules`] collects the rules for the
//! whole run.

use crate::imaging::Dimensions;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("row of {images} images has shares too large to express exactly")]
    Overflow { images: usize },
}

/// Greatest common divisor (Euclid). `gcd(0, n) == n`.
pub fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// GCD of every value in the list, never less than 1.
pub fn gcd_all(values: &[u128]) -> u128 {
    values.iter().copied().fold(0, gcd).max(1)
}

/// A fraction kept in lowest terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fraction {
    pub dividend: u128,
    pub divisor: u128,
}

impl Fraction {
    pub fn new(dividend: u128, divisor: u128) -> Self {
        let g = gcd(dividend, divisor).max(1);
        Self {
            dividend: dividend / g,
            divisor: divisor / g,
        }
    }
}

/// One image's place in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowLayoutUnit {
    pub width_share: u128,
    pub total_share: u128,
    pub image_count: usize,
}

impl RowLayoutUnit {
    /// CSS class of the `div` wrapping the image.
    pub fn class_name(&self) -> String {
        format!(
            "scale{}-{}-{}",
            self.width_share, self.total_share, self.image_count
        )
    }

    /// CSS rule sizing the wrapping `div` within a row of `image_count`
    /// images separated by `gutter_px`.
    pub fn css_rule(&self, gutter_px: u32) -> String {
        let gaps = (self.image_count.saturating_sub(1) as u64) * u64::from(gutter_px);
        format!(
            "div.{class} {{\n  width: calc({w}*(100% - {gaps}px) / {t});\n  object-fit: contain;\n}}\n",
            class = self.class_name(),
            w = self.width_share,
            t = self.total_share,
        )
    }
}

/// Least common multiple, or `None` if it does not fit in `u128`.
pub fn lcm(a: u128, b: u128) -> Option<u128> {
    if a == 0 || b == 0 {
        return Some(0);
    }
    (a / gcd(a, b)).checked_mul(b)
}

/// Compute the row layout for a group of images.
///
/// 1. All widths and heights are divided by their joint GCD.
/// 2. Each image's width at the smallest height becomes a reduced fraction.
/// 3. The fractions are put over the LCM of their divisors.
/// 4. The numerators and their sum are divided by the numerators' GCD.
///
/// Shares are exact. A row whose exact shares do not fit in `u128` is an
/// error, not a rounded layout.
pub fn layout(images: &[Dimensions]) -> Result<Vec<RowLayoutUnit>, LayoutError> {
    if images.is_empty() {
        return Ok(Vec::new());
    }
    let overflow = || LayoutError::Overflow {
        images: images.len(),
    };

    let all: Vec<u128> = images
        .iter()
        .flat_map(|d| [u128::from(d.width), u128::from(d.height)])
        .collect();
    let shared = gcd_all(&all);
    let reduced: Vec<(u128, u128)> = images
        .iter()
        .map(|d| (u128::from(d.width) / shared, u128::from(d.height) / shared))
        .collect();

    let min_height = reduced.iter().map(|&(_, h)| h).min().unwrap_or(1);
    let widths = reduced
        .iter()
        .map(|&(w, h)| {
            w.checked_mul(min_height)
                .map(|at_min_height| Fraction::new(at_min_height, h))
                .ok_or_else(overflow)
        })
        .collect::<Result<Vec<Fraction>, LayoutError>>()?;

    let mul = widths
        .iter()
        .try_fold(1u128, |acc, f| lcm(acc, f.divisor))
        .ok_or_else(overflow)?;
    let contributions = widths
        .iter()
        .map(|f| (mul / f.divisor).checked_mul(f.dividend).ok_or_else(overflow))
        .collect::<Result<Vec<u128>, LayoutError>>()?;
    let total = contributions
        .iter()
        .try_fold(0u128, |acc, &c| acc.checked_add(c))
        .ok_or_else(overflow)?;

    let g = gcd_all(&contributions);
    let total_share = total / g;
    Ok(contributions
        .iter()
        .map(|&c| RowLayoutUnit {
            width_share: c / g,
            total_share,
            image_count: images.len(),
        })
        .collect())
}

/// De-duplicated CSS rules for every row layout used in the run.
#[derive(Debug, Clone, Default)]
pub struct LayoutRules {
    gutter_px: u32,
    rules: BTreeMap<String, String>,
}

impl LayoutRules {
    pub fn new(gutter_px: u32) -> Self {
        Self {
            gutter_px,
            rules: BTreeMap::new(),
        }
    }

    /// Record the rule for `unit` and return its class name.
    pub fn register(&mut self, unit: &RowLayoutUnit) -> String {
        let class = unit.class_name();
        self.rules
            .entry(class.clone())
            .or_insert_with(|| unit.css_rule(self.gutter_px));
        class
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn class_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// The stylesheet, rules ordered by class name.
    pub fn to_css(&self) -> String {
        self.rules
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(list: &[(u32, u32)]) -> Vec<Dimensions> {
        list.iter().map(|&(w, h)| Dimensions::new(w, h)).collect()
    }

    fn shares(units: &[RowLayoutUnit]) -> Vec<u128> {
        units.iter().map(|u| u.width_share).collect()
    }

    #[test]
    fn gcd_basics() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(7, 13), 1);
        assert_eq!(gcd(0, 5), 5);
        assert_eq!(gcd_all(&[100, 200, 300]), 100);
        assert_eq!(gcd_all(&[2, 4]), 2);
        assert_eq!(gcd_all(&[]), 1);
    }

    #[test]
    fn fraction_is_reduced() {
        let f = Fraction::new(300, 200);
        assert_eq!((f.dividend, f.divisor), (3, 2));
    }

    #[test]
    fn single_image_takes_whole_row() {
        let units = layout(&dims(&[(100, 100)])).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].width_share, units[0].total_share);
        assert_eq!(units[0].image_count, 1);
        assert_eq!(units[0].class_name(), "scale1-1-1");
    }

    #[test]
    fn double_width_gets_double_share() {
        let units = layout(&dims(&[(100, 100), (200, 100)])).unwrap();
        assert_eq!(shares(&units), vec![1, 2]);
        assert_eq!(units[0].total_share, 3);
        assert_eq!(units[1].total_share, 3);
        assert!(units.iter().all(|u| u.image_count == 2));
    }

    #[test]
    fn total_is_sum_of_shares() {
        let units = layout(&dims(&[(640, 480), (480, 640), (1000, 1000)])).unwrap();
        let sum: u128 = shares(&units).iter().sum();
        assert_eq!(sum, units[0].total_share);
    }

    #[test]
    fn scale_invariance() {
        let small = layout(&dims(&[(4, 3), (3, 4), (16, 9)])).unwrap();
        let large = layout(&dims(&[(4000, 3000), (300, 400), (1920, 1080)])).unwrap();
        assert_eq!(small, large);

        let classes_small: Vec<String> = small.iter().map(RowLayoutUnit::class_name).collect();
        let classes_large: Vec<String> = large.iter().map(RowLayoutUnit::class_name).collect();
        assert_eq!(classes_small, classes_large);
    }

    #[test]
    fn heights_are_normalized_before_sharing() {
        // Same aspect ratio, different sizes: equal shares.
        let units = layout(&dims(&[(200, 100), (400, 200)])).unwrap();
        assert_eq!(shares(&units), vec![1, 1]);
        assert_eq!(units[0].total_share, 2);
    }

    #[test]
    fn portrait_and_landscape_mix() {
        // 3:2 landscape next to 2:3 portrait at common height: 9 : 4
        let units = layout(&dims(&[(300, 200), (200, 300)])).unwrap();
        assert_eq!(shares(&units), vec![9, 4]);
        assert_eq!(units[0].total_share, 13);
    }

    #[test]
    fn coprime_dimensions_still_reduce() {
        let units = layout(&dims(&[(1001, 997), (997, 1001)])).unwrap();
        let sum: u128 = shares(&units).iter().sum();
        assert_eq!(sum, units[0].total_share);
        assert_eq!(gcd(units[0].width_share, units[1].width_share), 1);
    }

    /// Distinct primes, so no two fractions share
    /// a divisor.
    const PRIME_HEIGHTS: [u32; 16] = [
        4001, 4003, 4007, 4013, 4019, 4021, 4027, 4049, 4051, 4057, 4073, 4079, 4091, 4093,
        4099, 4111,
    ];

    fn wide_row(count: usize) -> Vec<Dimensions> {
        PRIME_HEIGHTS[..count]
            .iter()
            .map(|&h| Dimensions::new(6000, h))
            .collect()
    }

    #[test]
    fn wide_row_of_unrelated_heights_stays_exact() {
        let units = layout(&wide_row(9)).unwrap();
        assert_eq!(units.len(), 9);
        let sum: u128 = shares(&units).iter().sum();
        assert_eq!(sum, units[0].total_share);
        assert_eq!(units[0].width_share, 68709663421192626890619271471);
        assert_eq!(units[0].total_share, 615288595836848767959402248881);

        // Taller images at the same width get strictly smaller shares.
        assert!(shares(&units).windows(2).all(|w| w[0] > w[1]));
        let classes: std::collections::HashSet<String> =
            units.iter().map(RowLayoutUnit::class_name).collect();
        assert_eq!(classes.len(), 9);
    }

    #[test]
    fn ten_unrelated_heights_do_not_panic() {
        let units = layout(&wide_row(10)).unwrap();
        let sum: u128 = shares(&units).iter().sum();
        assert_eq!(sum, units[0].total_share);
        assert!(units.iter().all(|u| u.image_count == 10));
    }

    #[test]
    fn row_beyond_exact_range_is_an_error() {
        let err = layout(&wide_row(16)).unwrap_err();
        assert!(matches!(err, LayoutError::Overflow { images: 16 }));
    }

    #[test]
    fn lcm_basics() {
        assert_eq!(lcm(4, 6), Some(12));
        assert_eq!(lcm(1, 7), Some(7));
        assert_eq!(lcm(0, 7), Some(0));
        assert_eq!(lcm(u128::MAX, 2), None);
    }

    #[test]
    fn empty_group_has_no_units() {
        assert!(layout(&[]).unwrap().is_empty());
    }

    #[test]
    fn css_rule_accounts_for_gutters() {
        let unit = RowLayoutUnit {
            width_share: 2,
            total_share: 3,
            image_count: 2,
        };
        let css = unit.css_rule(10);
        assert!(css.starts_with("div.scale2-3-2 {"));
        assert!(css.contains("width: calc(2*(100% - 10px) / 3);"));
        assert!(css.contains("object-fit: contain;"));
    }

    #[test]
    fn css_rule_single_image_has_no_gutter() {
        let unit = layout(&dims(&[(10, 10)])).unwrap()[0];
        assert!(unit.css_rule(10).contains("(100% - 0px)"));
    }

    #[test]
    fn rules_are_deduplicated() {
        let mut rules = LayoutRules::new(10);
        for unit in layout(&dims(&[(100, 100), (200, 100)])).unwrap() {
            rules.register(&unit);
        }
        for unit in layout(&dims(&[(50, 50), (100, 50)])).unwrap() {
            rules.register(&unit);
        }
        assert_eq!(rules.len(), 2);
        let names: Vec<&str> = rules.class_names().collect();
        assert_eq!(names, vec!["scale1-3-2", "scale2-3-2"]);
        assert_eq!(rules.to_css().matches("object-fit").count(), 2);
    }
}

//! Projection of activity coordinates onto terminal cells.

use ratatui::layout::Rect;

use crate::model::Itinerary;

/// Smallest span, in degrees, a map is allowed to cover.
const MIN_SPAN: f64 = 0.01;
const MARGIN: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Padded box around the points, or `None` when there are none.
    pub fn around(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (lat, lng) = iter.next()?;
        let mut b = Bounds {
            min_lat: lat,
            max_lat: lat,
            min_lng: lng,
            max_lng: lng,
        };
        for (lat, lng) in iter {
            b.min_lat = b.min_lat.min(lat);
            b.max_lat = b.max_lat.max(lat);
            b.min_lng = b.min_lng.min(lng);
            b.max_lng = b.max_lng.max(lng);
        }
        let (min_lat, max_lat) = pad(b.min_lat, b.max_lat);
        let (min_lng, max_lng) = pad(b.min_lng, b.max_lng);
        Some(Bounds {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Cell for a coordinate inside `area`. North is up.
    pub fn project(&self, area: Rect, lat: f64, lng: f64) -> (u16, u16) {
        let fx = (lng - self.min_lng) / (self.max_lng - self.min_lng);
        let fy = (self.max_lat - lat) / (self.max_lat - self.min_lat);
        let col = (fx.clamp(0.0, 1.0) * f64::from(area.width.saturating_sub(1))).round() as u16;
        let row = (fy.clamp(0.0, 1.0) * f64::from(area.height.saturating_sub(1))).round() as u16;
        (area.x + col, area.y + row)
    }
}

fn pad(min: f64, max: f64) -> (f64, f64) {
    let span = (max - min).max(MIN_SPAN);
    let mid = (min + max) / 2.0;
    let half = span * (0.5 + MARGIN);
    (mid - half, mid + half)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub index: usize,
    pub x: u16,
    pub y: u16,
}

/// One marker per activity that has a position, in index order.
pub fn place_markers(itinerary: &Itinerary, area: Rect) -> Vec<Marker> {
    if area.width == 0 || area.height == 0 {
        return Vec::new();
    }
    let placed: Vec<(usize, (f64, f64))> = itinerary
        .flatten()
        .filter_map(|(r, activity)| activity.coords().map(|c| (r.index, c)))
        .collect();
    let Some(bounds) = Bounds::around(placed.iter().map(|(_, c)| *c)) else {
        return Vec::new();
    };
    placed
        .into_iter()
        .map(|(index, (lat, lng))| {
            let (x, y) = bounds.project(area, lat, lng);
            Marker { index, x, y }
        })
        .collect()
}

/// Marker under a cell. Markers drawn later sit on top; a one-column slop
/// makes the single-cell glyphs easier to hit.
pub fn marker_at(markers: &[Marker], x: u16, y: u16) -> Option<usize> {
    markers
        .iter()
        .rev()
        .find(|m| m.x == x && m.y == y)
        .or_else(|| {
            markers
                .iter()
                .rev()
                .find(|m| m.y == y && m.x.abs_diff(x) <= 1)
        })
        .map(|m| m.index)
}

pub fn osm_url(lat: f64, lng: f64) -> String {
    format!("https://www.openstreetmap.org/?mlat={lat:.5}&mlon={lng:.5}#map=16/{lat:.5}/{lng:.5}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::three_days;

    fn area() -> Rect {
        Rect::new(10, 5, 21, 11)
    }

    #[test]
    fn corners_project_to_the_edges_of_the_padded_box() {
        let bounds = Bounds {
            min_lat: 0.0,
            max_lat: 10.0,
            min_lng: 100.0,
            max_lng: 120.0,
        };
        assert_eq!(bounds.project(area(), 10.0, 100.0), (10, 5));
        assert_eq!(bounds.project(area(), 0.0, 120.0), (30, 15));
        assert_eq!(bounds.project(area(), 5.0, 110.0), (20, 10));
    }

    #[test]
    fn single_point_is_centered() {
        let bounds = Bounds::around([(35.0, 135.7)]).unwrap();
        assert!(bounds.max_lat > bounds.min_lat);
        assert_eq!(bounds.project(area(), 35.0, 135.7), (20, 10));
        assert!(Bounds::around(std::iter::empty()).is_none());
    }

    #[test]
    fn only_placed_activities_get_markers() {
        let mut itinerary = three_days();
        itinerary.itinerary[0].activities[1].lat = Some(34.99);
        itinerary.itinerary[0].activities[1].lng = Some(135.78);
        itinerary.itinerary[2].activities[0].lat = Some(35.03);
        itinerary.itinerary[2].activities[0].lng = Some(135.72);
        itinerary.itinerary[2].activities[2].lat = Some(0.0);
        itinerary.itinerary[2].activities[2].lng = Some(0.0);

        let markers = place_markers(&itinerary, area());
        let indices: Vec<usize> = markers.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![1, 2]);
        // North-west of the pair lands up and to the left.
        assert!(markers[1].y < markers[0].y);
        assert!(markers[1].x < markers[0].x);
    }

    #[test]
    fn hit_testing_prefers_exact_then_adjacent() {
        let markers = [
            Marker { index: 0, x: 5, y: 5 },
            Marker { index: 3, x: 7, y: 5 },
        ];
        assert_eq!(marker_at(&markers, 5, 5), Some(0));
        assert_eq!(marker_at(&markers, 6, 5), Some(3));
        assert_eq!(marker_at(&markers, 4, 5), Some(0));
        assert_eq!(marker_at(&markers, 5, 6), None);
    }

    #[test]
    fn osm_links_carry_both_coordinates() {
        assert_eq!(
            osm_url(9.5, 76.3),
            "https://www.openstreetmap.org/?mlat=9.50000&mlon=76.30000#map=16/9.50000/76.30000"
        );
    }
}

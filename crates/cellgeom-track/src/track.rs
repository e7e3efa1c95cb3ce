//! The track itself: origin, direction, pending crossings and links.

use cellgeom_math::{Point3, Tolerance, Vec3};
use tracing::trace;

use crate::{IntersectionPoint, Link, ObjectId, TrackDirection};

/// A half-line `origin + t * direction`, `t >= 0`, with the crossings and
/// links found along it.
#[derive(Debug, Clone)]
pub struct Track {
    origin: Point3,
    direction: Vec3,
    points: Vec<IntersectionPoint>,
    links: Vec<Link>,
}

impl Track {
    /// Create a track. The direction is normalized; a zero direction stays
    /// zero and crosses nothing.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: normalize_or_zero(&direction),
            points: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Start of the track.
    pub fn start_point(&self) -> &Point3 {
        &self.origin
    }

    /// Unit direction of the track (zero for a degenerate track).
    pub fn direction(&self) -> &Vec3 {
        &self.direction
    }

    /// Point at distance `t` along the track.
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction
    }

    /// Move the track and drop every crossing and link.
    pub fn reset(&mut self, origin: Point3, direction: Vec3) {
        self.origin = origin;
        self.direction = normalize_or_zero(&direction);
        self.clear_intersection_results();
    }

    /// Drop every crossing and link, keeping origin and direction.
    pub fn clear_intersection_results(&mut self) {
        self.points.clear();
        self.links.clear();
    }

    /// Record a crossing. Pending crossings stay sorted by distance from
    /// the origin; a tie goes in front of the earlier crossing.
    pub fn add_point(&mut self, direction: TrackDirection, point: Point3, object: ObjectId) {
        let distance = (point - self.origin).norm();
        let at = self.points.partition_point(|p| p.distance < distance);
        self.points.insert(
            at,
            IntersectionPoint {
                direction,
                point,
                distance,
                object,
            },
        );
    }

    /// Insert a link ordered by its exit distance; returns its index.
    pub fn add_link(
        &mut self,
        entry: Point3,
        exit: Point3,
        distance_from_start: f64,
        object: ObjectId,
    ) -> usize {
        let link = Link::new(entry, exit, distance_from_start, object);
        let at = self
            .links
            .partition_point(|l| l.distance_from_start < link.distance_from_start);
        self.links.insert(at, link);
        at
    }

    /// Pair pending crossings into links and clear them.
    ///
    /// Leading `Leaving` crossings mean the origin was inside: each links
    /// back to the last good point (the origin for the first). After the
    /// first `Entering` crossing, each `Entering` followed by a `Leaving`
    /// becomes a link; a pair closer than the tolerance collapses to a
    /// link ending at the entry. Anything else is a glancing touch and is
    /// skipped.
    pub fn build_link(&mut self, tol: &Tolerance) {
        if self.points.is_empty() {
            return;
        }
        let points = std::mem::take(&mut self.points);
        let mut work = self.origin;
        let mut ac = 0;

        while ac < points.len() && points[ac].direction != TrackDirection::Entering {
            let p = &points[ac];
            self.add_link(work, p.point, p.distance, p.object);
            work = p.point;
            ac += 1;
        }
        if ac < points.len() {
            work = points[ac].point;
        }

        while ac + 1 < points.len() {
            let (a, b) = (&points[ac], &points[ac + 1]);
            if a.direction == TrackDirection::Entering && b.direction == TrackDirection::Leaving {
                if (a.distance - b.distance).abs() > tol.linear {
                    self.add_link(a.point, b.point, b.distance, a.object);
                } else {
                    self.add_link(work, a.point, a.distance, a.object);
                }
                work = b.point;
                ac += 2;
            } else {
                trace!(distance = a.distance, object = a.object, "skipping glancing crossing");
                ac += 1;
            }
        }
    }

    /// Merge neighbouring links of the same object that join end to start.
    pub fn remove_co_joins(&mut self, tol: &Tolerance) {
        if self.links.len() < 2 {
            return;
        }
        let mut merged: Vec<Link> = Vec::with_capacity(self.links.len());
        for link in self.links.drain(..) {
            match merged.last_mut() {
                Some(prev)
                    if prev.object == link.object && tol.points_equal(&prev.exit, &link.entry) =>
                {
                    prev.exit = link.exit;
                    prev.distance_from_start = link.distance_from_start;
                    prev.distance_inside = (prev.exit - prev.entry).norm();
                }
                _ => merged.push(link),
            }
        }
        self.links = merged;
    }

    /// True if the links do not cover the track continuously from the
    /// origin to the last exit.
    pub fn non_complete(&self, tol: &Tolerance) -> bool {
        let Some(first) = self.links.first() else {
            return false;
        };
        if !tol.points_equal(&self.origin, &first.entry) {
            return true;
        }
        self.links
            .windows(2)
            .any(|pair| !tol.points_equal(&pair[0].exit, &pair[1].entry))
    }

    /// Number of links.
    pub fn count(&self) -> usize {
        self.links.len()
    }

    /// Links in order of exit distance.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Iterate the links in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Link> {
        self.links.iter()
    }

    /// First link along the track.
    pub fn front(&self) -> Option<&Link> {
        self.links.first()
    }

    /// Last link along the track.
    pub fn back(&self) -> Option<&Link> {
        self.links.last()
    }

    /// Crossings not yet turned into links.
    pub fn pending_points(&self) -> &[IntersectionPoint] {
        &self.points
    }

    /// Sum of the inside distances of every link.
    pub fn total_distance_inside(&self) -> f64 {
        self.links.iter().map(|l| l.distance_inside).sum()
    }
}

impl<'a> IntoIterator for &'a Track {
    type Item = &'a Link;
    type IntoIter = std::slice::Iter<'a, Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn normalize_or_zero(v: &Vec3) -> Vec3 {
    v.try_normalize(0.0).unwrap_or_else(Vec3::zeros)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TOL: Tolerance = Tolerance::DEFAULT;

    fn x_track() -> Track {
        Track::new(Point3::new(-5.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0))
    }

    fn on_x(x: f64) -> Point3 {
        Point3::new(x, 0.0, 0.0)
    }

    #[test]
    fn test_direction_is_normalized() {
        let track = x_track();
        assert_relative_eq!(track.direction().norm(), 1.0);
        assert_eq!(track.at(2.0), on_x(-3.0));
    }

    #[test]
    fn test_zero_direction_stays_zero() {
        let track = Track::new(Point3::origin(), Vec3::zeros());
        assert_eq!(*track.direction(), Vec3::zeros());
    }

    #[test]
    fn test_points_kept_sorted() {
        let mut track = x_track();
        track.add_point(TrackDirection::Leaving, on_x(3.0), 1);
        track.add_point(TrackDirection::Entering, on_x(-1.0), 1);
        track.add_point(TrackDirection::Entering, on_x(1.0), 2);
        let distances: Vec<f64> = track.pending_points().iter().map(|p| p.distance).collect();
        assert_eq!(distances, vec![4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_single_pair_makes_one_link() {
        let mut track = x_track();
        track.add_point(TrackDirection::Entering, on_x(-1.0), 7);
        track.add_point(TrackDirection::Leaving, on_x(1.0), 7);
        track.build_link(&TOL);

        assert_eq!(track.count(), 1);
        assert!(track.pending_points().is_empty());
        let link = track.front().unwrap();
        assert_eq!(link.entry, on_x(-1.0));
        assert_eq!(link.exit, on_x(1.0));
        assert_relative_eq!(link.distance_from_start, 6.0);
        assert_relative_eq!(link.distance_inside, 2.0);
        assert_eq!(link.object, 7);
    }

    #[test]
    fn test_leading_leaving_starts_at_origin() {
        let mut track = Track::new(Point3::origin(), Vec3::x());
        track.add_point(TrackDirection::Leaving, on_x(0.5), 1);
        track.add_point(TrackDirection::Entering, on_x(2.0), 1);
        track.add_point(TrackDirection::Leaving, on_x(3.0), 1);
        track.build_link(&TOL);

        assert_eq!(track.count(), 2);
        assert_eq!(track.links()[0].entry, Point3::origin());
        assert_eq!(track.links()[0].exit, on_x(0.5));
        assert_eq!(track.links()[1].entry, on_x(2.0));
        assert_relative_eq!(track.total_distance_inside(), 1.5);
    }

    #[test]
    fn test_glancing_points_are_skipped() {
        let mut track = Track::new(Point3::origin(), Vec3::x());
        track.add_point(TrackDirection::Entering, on_x(1.0), 1);
        track.add_point(TrackDirection::Entering, on_x(2.0), 1);
        track.add_point(TrackDirection::Leaving, on_x(4.0), 1);
        track.build_link(&TOL);

        assert_eq!(track.count(), 1);
        assert_eq!(track.front().unwrap().entry, on_x(2.0));
    }

    #[test]
    fn test_touching_pair_collapses() {
        let mut track = Track::new(Point3::origin(), Vec3::x());
        track.add_point(TrackDirection::Entering, on_x(2.0), 1);
        track.add_point(TrackDirection::Leaving, on_x(2.0 + 1e-9), 1);
        track.build_link(&TOL);

        assert_eq!(track.count(), 1);
        let link = track.front().unwrap();
        assert_eq!(link.entry, on_x(2.0));
        assert_eq!(link.exit, on_x(2.0));
        assert_eq!(link.distance_inside, 0.0);
    }

    #[test]
    fn test_links_sorted_across_objects() {
        let mut track = Track::new(Point3::origin(), Vec3::x());
        track.add_point(TrackDirection::Entering, on_x(5.0), 2);
        track.add_point(TrackDirection::Leaving, on_x(6.0), 2);
        track.build_link(&TOL);
        track.add_point(TrackDirection::Entering, on_x(1.0), 1);
        track.add_point(TrackDirection::Leaving, on_x(2.0), 1);
        track.build_link(&TOL);

        let objects: Vec<ObjectId> = track.iter().map(|l| l.object).collect();
        assert_eq!(objects, vec![1, 2]);
        assert_eq!(track.back().unwrap().exit, on_x(6.0));
    }

    #[test]
    fn test_remove_co_joins_merges_touching_links() {
        let mut track = Track::new(Point3::origin(), Vec3::x());
        track.add_link(Point3::origin(), on_x(1.0), 1.0, 3);
        track.add_link(on_x(1.0), on_x(2.5), 2.5, 3);
        track.add_link(on_x(2.5), on_x(4.0), 4.0, 4);
        track.remove_co_joins(&TOL);

        assert_eq!(track.count(), 2);
        let first = track.front().unwrap();
        assert_eq!(first.exit, on_x(2.5));
        assert_relative_eq!(first.distance_from_start, 2.5);
        assert_relative_eq!(first.distance_inside, 2.5);
    }

    #[test]
    fn test_non_complete_detects_gaps() {
        let mut track = Track::new(Point3::origin(), Vec3::x());
        assert!(!track.non_complete(&TOL));

        track.add_link(Point3::origin(), on_x(1.0), 1.0, 1);
        track.add_link(on_x(1.0), on_x(2.0), 2.0, 2);
        assert!(!track.non_complete(&TOL));

        track.add_link(on_x(3.0), on_x(4.0), 4.0, 3);
        assert!(track.non_complete(&TOL));
    }

    #[test]
    fn test_reset_clears_results() {
        let mut track = x_track();
        track.add_link(on_x(0.0), on_x(1.0), 6.0, 1);
        track.add_point(TrackDirection::Entering, on_x(2.0), 1);
        track.reset(Point3::origin(), Vec3::y());
        assert_eq!(track.count(), 0);
        assert!(track.pending_points().is_empty());
        assert_eq!(*track.direction(), Vec3::y());
    }
}

#![warn(missing_docs)]

//! Tracks for the cellgeom engine.
//!
//! A [`Track`] is a half-line through the geometry. Objects report the
//! points where the track crosses their boundary as [`IntersectionPoint`]s;
//! [`Track::build_link`] then turns those crossings into [`Link`]s, the
//! segments of the track that lie inside an object.
//!
//! ```
//! use cellgeom_math::{Point3, Tolerance, Vec3};
//! use cellgeom_track::{Track, TrackDirection};
//!
//! let mut track = Track::new(Point3::new(-1.0, 0.0, 0.0), Vec3::x());
//! track.add_point(TrackDirection::Entering, Point3::new(0.0, 0.0, 0.0), 1);
//! track.add_point(TrackDirection::Leaving, Point3::new(2.0, 0.0, 0.0), 1);
//! track.build_link(&Tolerance::DEFAULT);
//!
//! assert_eq!(track.count(), 1);
//! assert_eq!(track.front().unwrap().distance_inside, 2.0);
//! ```

mod track;

pub use track::Track;

use cellgeom_math::Point3;

/// Identifier of the object a crossing or link belongs to.
pub type ObjectId = i32;

/// Whether the track enters or leaves an object at a crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackDirection {
    /// The track moves from outside to inside.
    Entering,
    /// The track moves from inside to outside.
    Leaving,
}

/// A single boundary crossing, not yet paired into a link.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionPoint {
    /// Entering or leaving.
    pub direction: TrackDirection,
    /// Location of the crossing.
    pub point: Point3,
    /// Distance from the track origin.
    pub distance: f64,
    /// Object whose boundary was crossed.
    pub object: ObjectId,
}

/// A segment of a track inside one object.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// Where the segment starts.
    pub entry: Point3,
    /// Where the segment ends.
    pub exit: Point3,
    /// Distance from the track origin to `exit`. Links are ordered by it.
    pub distance_from_start: f64,
    /// Length of the segment.
    pub distance_inside: f64,
    /// Object the segment lies in.
    pub object: ObjectId,
}

impl Link {
    /// Create a link; the inside distance is the entry-exit length.
    pub fn new(entry: Point3, exit: Point3, distance_from_start: f64, object: ObjectId) -> Self {
        Self {
            entry,
            exit,
            distance_from_start,
            distance_inside: (exit - entry).norm(),
            object,
        }
    }
}

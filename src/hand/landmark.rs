//! Hand landmarks.

use std::ops::Index;

/// A position inside an image, expressed as a fraction of the image width and height.
///
/// `x` and `y` are in range `0.0..=1.0` for points inside the image, but nothing enforces this:
/// the tracking graph can report landmarks slightly outside of the frame. `z` is the landmark
/// depth relative to the wrist, on roughly the same scale as `x`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl NormalizedPoint {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Converts this point to pixel coordinates in an image of size `width x height`.
    ///
    /// The fractional part is truncated (towards zero), not rounded.
    #[inline]
    pub fn to_pixel(&self, width: u32, height: u32) -> (i32, i32) {
        let x = width as f32 * self.x;
        let y = height as f32 * self.y;
        (x as i32, y as i32)
    }
}

/// The 21 landmarks of a single tracked hand, indexed by [`LandmarkIdx`].
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    landmarks: [NormalizedPoint; Skeleton::NUM_LANDMARKS],
}

impl Skeleton {
    pub const NUM_LANDMARKS: usize = 21;

    pub fn new(landmarks: [NormalizedPoint; Self::NUM_LANDMARKS]) -> Self {
        Self { landmarks }
    }

    /// Creates a skeleton from exactly [`Skeleton::NUM_LANDMARKS`] landmarks.
    ///
    /// Returns `None` if `landmarks` yields fewer or more points.
    pub fn from_landmarks(landmarks: impl IntoIterator<Item = NormalizedPoint>) -> Option<Self> {
        let mut iter = landmarks.into_iter();
        let mut points = [NormalizedPoint::default(); Self::NUM_LANDMARKS];
        for point in &mut points {
            *point = iter.next()?;
        }
        if iter.next().is_some() {
            return None;
        }
        Some(Self::new(points))
    }

    /// Creates a skeleton that has all of its landmarks at `point`.
    pub fn splat(point: NormalizedPoint) -> Self {
        Self::new([point; Self::NUM_LANDMARKS])
    }

    /// Returns the landmarks in [`LandmarkIdx`] order.
    #[inline]
    pub fn landmarks(&self) -> &[NormalizedPoint; Self::NUM_LANDMARKS] {
        &self.landmarks
    }

    #[inline]
    pub fn landmarks_mut(&mut self) -> &mut [NormalizedPoint; Self::NUM_LANDMARKS] {
        &mut self.landmarks
    }

    /// Returns the bones of this skeleton as pairs of landmark positions.
    pub fn bones(&self) -> impl Iterator<Item = (NormalizedPoint, NormalizedPoint)> + '_ {
        CONNECTIONS.iter().map(|&(a, b)| (self[a], self[b]))
    }
}

impl Index<LandmarkIdx> for Skeleton {
    type Output = NormalizedPoint;

    #[inline]
    fn index(&self, index: LandmarkIdx) -> &NormalizedPoint {
        &self.landmarks[index as usize]
    }
}

/// Names for the hand pose landmarks.
///
/// # Terminology
///
/// - **CMC**: [Carpometacarpal joint], the lowest joint of the thumb, located near the wrist.
/// - **MCP**: [Metacarpophalangeal joint], the lower joint forming the knuckles near the palm of
///   the hand.
/// - **IP**: Interphalangeal joint, the only joint between the thumb's MCP and its tip.
/// - **PIP**: Proximal Interphalangeal joint, the joint between the MCP and DIP.
/// - **DIP**: Distal Interphalangeal joint, the highest joint of a finger.
/// - **Tip**: This landmark is just placed on the tip of the finger, above the DIP.
///
/// [Carpometacarpal joint]: https://en.wikipedia.org/wiki/Carpometacarpal_joint
/// [Metacarpophalangeal joint]: https://en.wikipedia.org/wiki/Metacarpophalangeal_joint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandmarkIdx {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

impl LandmarkIdx {
    /// All landmarks, in index order.
    pub const ALL: [LandmarkIdx; Skeleton::NUM_LANDMARKS] = {
        use LandmarkIdx::*;
        [
            Wrist,
            ThumbCmc,
            ThumbMcp,
            ThumbIp,
            ThumbTip,
            IndexFingerMcp,
            IndexFingerPip,
            IndexFingerDip,
            IndexFingerTip,
            MiddleFingerMcp,
            MiddleFingerPip,
            MiddleFingerDip,
            MiddleFingerTip,
            RingFingerMcp,
            RingFingerPip,
            RingFingerDip,
            RingFingerTip,
            PinkyMcp,
            PinkyPip,
            PinkyDip,
            PinkyTip,
        ]
    };
}

/// The bones of the hand, rooted at the wrist.
pub const CONNECTIONS: [(LandmarkIdx, LandmarkIdx); 21] = {
    use LandmarkIdx::*;
    [
        // Thumb:
        (Wrist, ThumbCmc),
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        // Index:
        (Wrist, IndexFingerMcp),
        (IndexFingerMcp, IndexFingerPip),
        (IndexFingerPip, IndexFingerDip),
        (IndexFingerDip, IndexFingerTip),
        // Middle:
        (IndexFingerMcp, MiddleFingerMcp),
        (MiddleFingerMcp, MiddleFingerPip),
        (MiddleFingerPip, MiddleFingerDip),
        (MiddleFingerDip, MiddleFingerTip),
        // Ring:
        (MiddleFingerMcp, RingFingerMcp),
        (RingFingerMcp, RingFingerPip),
        (RingFingerPip, RingFingerDip),
        (RingFingerDip, RingFingerTip),
        // Pinky:
        (RingFingerMcp, PinkyMcp),
        (Wrist, PinkyMcp),
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
    ]
};

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn landmark_order() {
        for (i, lm) in LandmarkIdx::ALL.iter().enumerate() {
            assert_eq!(*lm as usize, i);
        }
    }

    #[test]
    fn every_landmark_is_connected() {
        let connected = CONNECTIONS
            .iter()
            .flat_map(|&(a, b)| [a, b])
            .collect::<HashSet<_>>();
        assert_eq!(connected.len(), Skeleton::NUM_LANDMARKS);
    }

    #[test]
    fn connections_are_unique() {
        let unique = CONNECTIONS
            .iter()
            .map(|&(a, b)| if (a as usize) < (b as usize) { (a, b) } else { (b, a) })
            .collect::<HashSet<_>>();
        assert_eq!(unique.len(), CONNECTIONS.len());
    }

    #[test]
    fn to_pixel_truncates() {
        assert_eq!(NormalizedPoint::new(0.5, 0.5).to_pixel(101, 101), (50, 50));
        assert_eq!(NormalizedPoint::new(0.999, 0.0).to_pixel(10, 10), (9, 0));
        assert_eq!(NormalizedPoint::new(1.0, 1.0).to_pixel(640, 480), (640, 480));
        // Truncation is towards zero, so slightly negative values land on 0.
        assert_eq!(NormalizedPoint::new(-0.001, -0.5).to_pixel(100, 10), (0, -5));
    }

    #[test]
    fn from_landmarks_needs_every_landmark() {
        let points = (0..21)
            .map(|i| NormalizedPoint::new(i as f32 / 20.0, 0.5))
            .collect::<Vec<_>>();
        let skeleton = Skeleton::from_landmarks(points.iter().copied()).unwrap();
        assert_eq!(skeleton[LandmarkIdx::Wrist], NormalizedPoint::new(0.0, 0.5));
        assert_eq!(skeleton[LandmarkIdx::PinkyTip], NormalizedPoint::new(1.0, 0.5));

        assert_eq!(Skeleton::from_landmarks(points[..20].iter().copied()), None);
        assert_eq!(Skeleton::from_landmarks([]), None);
        let too_many = points.iter().copied().chain([NormalizedPoint::default()]);
        assert_eq!(Skeleton::from_landmarks(too_many), None);
    }

    #[test]
    fn bones() {
        let mut skeleton = Skeleton::splat(NormalizedPoint::default());
        skeleton.landmarks_mut()[LandmarkIdx::ThumbTip as usize] = NormalizedPoint::new(1.0, 1.0);
        let bones = skeleton.bones().collect::<Vec<_>>();
        assert_eq!(bones.len(), 21);
        assert_eq!(
            bones[3],
            (NormalizedPoint::default(), NormalizedPoint::new(1.0, 1.0))
        );
    }
}

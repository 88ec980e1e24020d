use serde_derive::{Deserialize, Serialize};
use std::marker::PhantomData;

pub trait BBoxFormat: std::fmt::Debug {}

/// Left-top-width-height format, contains left top corner and width-height
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ltwh;
impl BBoxFormat for Ltwh {}

/// Left-top-right-bottom format, contains left top and right bottom corners
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

/// Runtime tag for the layout a box arrives in (or should leave in).
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoxFormat {
    #[default]
    Ltrb,
    Ltwh,
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(transparent)]
pub struct BBox<F: BBoxFormat>([f32; 4], #[serde(skip)] PhantomData<F>);

impl<F: BBoxFormat> From<BBox<F>> for [f32; 4] {
    fn from(bbox: BBox<F>) -> Self {
        bbox.0
    }
}

impl<F: BBoxFormat> BBox<F> {
    #[inline]
    pub fn as_slice(&self) -> &[f32; 4] {
        &self.0
    }

    // Use carefully when you REALLY sure that slice have needed format
    #[inline(always)]
    pub fn assigned(slice: &[f32; 4]) -> Self {
        BBox(*slice, Default::default())
    }
}

impl BBox<Ltwh> {
    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }
}

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(x1: f32, x2: f32, x3: f32, x4: f32) -> Self {
        BBox([x1, x2, x3, x4], Default::default())
    }

    /// Zero box, written for frames where nobody was detected.
    #[inline]
    pub fn zero() -> Self {
        Self::ltrb(0.0, 0.0, 0.0, 0.0)
    }

    /// Interprets raw estimator output laid out as `format`.
    #[inline]
    pub fn from_format(raw: [f32; 4], format: BoxFormat) -> Self {
        match format {
            BoxFormat::Ltrb => BBox(raw, Default::default()),
            BoxFormat::Ltwh => BBox::<Ltwh>(raw, Default::default()).as_ltrb(),
        }
    }

    /// Raw coordinates laid out as `format`.
    #[inline]
    pub fn to_format(&self, format: BoxFormat) -> [f32; 4] {
        match format {
            BoxFormat::Ltrb => self.0,
            BoxFormat::Ltwh => self.as_ltwh().0,
        }
    }

    #[inline]
    pub fn as_ltwh(&self) -> BBox<Ltwh> {
        self.into()
    }

    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.0[3]
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.0[2] - self.0[0]
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.0[3] - self.0[1]
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// `x2 < x1` or `y2 < y1`; such a box violates the input contract.
    #[inline]
    pub fn has_negative_extent(&self) -> bool {
        self.width() < 0.0 || self.height() < 0.0
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.area() <= 0.0
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (
            (self.0[0] + self.0[2]) / 2.0,
            (self.0[1] + self.0[3]) / 2.0,
        )
    }

    pub fn intersection_area(&self, other: &BBox<Ltrb>) -> f32 {
        let i_left = self.left().max(other.left());
        let i_top = self.top().max(other.top());
        let i_right = self.right().min(other.right());
        let i_bottom = self.bottom().min(other.bottom());

        (i_right - i_left).max(0.) * (i_bottom - i_top).max(0.)
    }

    /// Fraction of `self`'s area shared with `other`. Asymmetric, unlike IoU.
    /// A zero-area `self` yields 0.
    pub fn overlap_ratio(&self, other: &BBox<Ltrb>) -> f32 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }

        self.intersection_area(other) / area
    }

    /// Smallest box enclosing both.
    pub fn union(&self, other: &BBox<Ltrb>) -> BBox<Ltrb> {
        BBox::ltrb(
            self.left().min(other.left()),
            self.top().min(other.top()),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }
}

impl<'a> From<&'a BBox<Ltwh>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Ltwh>) -> Self {
        Self(
            [v.0[0], v.0[1], v.0[2] + v.0[0], v.0[3] + v.0[1]],
            Default::default(),
        )
    }
}

impl<'a> From<&'a BBox<Ltrb>> for BBox<Ltwh> {
    #[inline]
    fn from(v: &'a BBox<Ltrb>) -> Self {
        Self(
            [v.0[0], v.0[1], v.0[2] - v.0[0], v.0[3] - v.0[1]],
            Default::default(),
        )
    }
}

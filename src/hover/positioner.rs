use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn at(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Distance from `point` to the nearest point of the rect; zero inside.
    pub fn distance_to(&self, point: Point) -> f64 {
        let nearest = Point::new(
            point.x.clamp(self.x, self.right()),
            point.y.clamp(self.y, self.bottom()),
        );
        nearest.distance_to(point)
    }

    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Placement {
    Default,
    Above,
    Below,
    LeftOf,
    RightOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPlacement {
    pub position: Point,
    pub placement: Placement,
    pub overlap_area: f64,
}

/// Places the hover card next to the pointer without covering the axis it
/// describes, keeping it on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverCardPositioner {
    /// Minimum distance from the viewport edges.
    pub margin: f64,
    /// Default offset from the anchor, both axes.
    pub offset: f64,
    /// Space left between the card and the protected rect.
    pub gap: f64,
}

impl Default for HoverCardPositioner {
    fn default() -> Self {
        Self {
            margin: 8.0,
            offset: 16.0,
            gap: 8.0,
        }
    }
}

impl HoverCardPositioner {
    pub fn new(margin: f64, offset: f64, gap: f64) -> Self {
        Self {
            margin,
            offset,
            gap,
        }
    }

    fn clamp_into(&self, position: Point, card: Size, viewport: Size) -> Point {
        let max_x = (viewport.width - card.width - self.margin).max(self.margin);
        let max_y = (viewport.height - card.height - self.margin).max(self.margin);
        Point::new(
            position.x.clamp(self.margin, max_x),
            position.y.clamp(self.margin, max_y),
        )
    }

    fn candidates(&self, anchor: Point, card: Size, protected: &Rect) -> [(Placement, Point); 5] {
        let centered_x = anchor.x - card.width / 2.0;
        let centered_y = anchor.y - card.height / 2.0;
        [
            (
                Placement::Default,
                Point::new(anchor.x + self.offset, anchor.y + self.offset),
            ),
            (
                Placement::Above,
                Point::new(centered_x, protected.y - self.gap - card.height),
            ),
            (
                Placement::Below,
                Point::new(centered_x, protected.bottom() + self.gap),
            ),
            (
                Placement::LeftOf,
                Point::new(protected.x - self.gap - card.width, centered_y),
            ),
            (
                Placement::RightOf,
                Point::new(protected.right() + self.gap, centered_y),
            ),
        ]
    }

    /// Any candidate clear of `protected` wins, nearest to the anchor first;
    /// otherwise the one covering the least of it.
    pub fn place(&self, anchor: Point, card: Size, viewport: Size, protected: Rect) -> CardPlacement {
        self.candidates(anchor, card, &protected)
            .into_iter()
            .map(|(placement, raw)| {
                let position = self.clamp_into(raw, card, viewport);
                let rect = Rect::at(position, card);
                let overlap_area = rect.intersection_area(&protected);
                let distance = rect.distance_to(anchor);
                (
                    CardPlacement {
                        position,
                        placement,
                        overlap_area,
                    },
                    distance,
                )
            })
            .min_by(|(a, da), (b, db)| {
                a.overlap_area
                    .total_cmp(&b.overlap_area)
                    .then(da.total_cmp(db))
            })
            .map(|(placement, _)| placement)
            .unwrap_or(CardPlacement {
                position: self.clamp_into(anchor, card, viewport),
                placement: Placement::Default,
                overlap_area: 0.0,
            })
    }
}

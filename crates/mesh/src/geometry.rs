use cgmath::InnerSpace;

pub type Vector3 = cgmath::Vector3<f32>;

#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Triangle {
    pub p0: Vector3,
    pub p1: Vector3,
    pub p2: Vector3,
}

impl Triangle {
    /// Unit normal following the right-hand rule over `p0 -> p1 -> p2`.
    ///
    /// Degenerate triangles (zero area) yield the zero vector rather than NaNs, which is also
    /// what most STL writers emit for them.
    pub fn normal(&self) -> Vector3 {
        let n = (self.p1 - self.p0).cross(self.p2 - self.p0);
        let len = n.magnitude();
        if len > f32::EPSILON {
            n / len
        } else {
            Vector3::new(0.0, 0.0, 0.0)
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Bounds {
    pub min: Vector3,
    pub max: Vector3,
}

impl Bounds {
    pub fn from_point(p: Vector3) -> Self {
        Self { min: p, max: p }
    }

    pub fn include(&mut self, p: Vector3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn size(&self) -> Vector3 {
        self.max - self.min
    }
}

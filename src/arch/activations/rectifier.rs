#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Relu;

impl Relu {
    pub fn f(&self, z: f32) -> f32 {
        z.max(0.)
    }

    /// The derivative at exactly zero is taken as zero.
    pub fn df(&self, z: f32) -> f32 {
        if z > 0. { 1. } else { 0. }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeakyRelu {
    alpha: f32,
}

impl LeakyRelu {
    pub fn new(alpha: f32) -> Self {
        Self { alpha }
    }

    pub fn f(&self, z: f32) -> f32 {
        if z > 0. { z } else { self.alpha * z }
    }

    pub fn df(&self, z: f32) -> f32 {
        if z > 0. { 1. } else { self.alpha }
    }
}

impl Default for LeakyRelu {
    fn default() -> Self {
        Self::new(0.2)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Elu {
    alpha: f32,
}

impl Elu {
    pub fn new(alpha: f32) -> Self {
        Self { alpha }
    }

    pub fn f(&self, z: f32) -> f32 {
        if z > 0. { z } else { self.alpha * (z.exp() - 1.) }
    }

    pub fn df(&self, z: f32) -> f32 {
        if z > 0. { 1. } else { self.alpha * z.exp() }
    }
}

impl Default for Elu {
    fn default() -> Self {
        Self::new(1.)
    }
}

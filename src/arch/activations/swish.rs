/// `z * sigmoid(z)`, the activation the extractor is usually configured with.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Swish;

impl Swish {
    fn sigmoid(z: f32) -> f32 {
        1. / (1. + (-z).exp())
    }

    pub fn f(&self, z: f32) -> f32 {
        z * Self::sigmoid(z)
    }

    pub fn df(&self, z: f32) -> f32 {
        let s = Self::sigmoid(z);
        s + z * s * (1. - s)
    }
}

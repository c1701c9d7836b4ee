/// A learnable parameter group and the gradient computed for it on the last backward pass.
///
/// Both slices have the same length; optimizers keep one state per slot, so the order in which a
/// model yields its slots must be stable across calls.
pub struct ParamSlot<'a> {
    pub params: &'a mut [f32],
    pub grad: &'a mut [f32],
}

impl<'a> ParamSlot<'a> {
    pub fn new(params: &'a mut [f32], grad: &'a mut [f32]) -> Self {
        Self { params, grad }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Holds a mutable scalar written by drivers and read by composers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ValueNode {
    pub value: f64,
}

impl ValueNode {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

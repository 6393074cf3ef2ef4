use logiccore::{Node, NodeContext, NodeError, NodeFactory, NodeMetadata, Value};
use std::sync::Arc;

/// Binary arithmetic on numbers and vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    pub const ALL: [ArithmeticOp; 4] = [
        ArithmeticOp::Add,
        ArithmeticOp::Subtract,
        ArithmeticOp::Multiply,
        ArithmeticOp::Divide,
    ];

    pub fn node_type(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "math.add",
            ArithmeticOp::Subtract => "math.subtract",
            ArithmeticOp::Multiply => "math.multiply",
            ArithmeticOp::Divide => "math.divide",
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
        }
    }

    fn scalar(&self, a: f64, b: f64) -> Result<f64, NodeError> {
        match self {
            ArithmeticOp::Add => Ok(a + b),
            ArithmeticOp::Subtract => Ok(a - b),
            ArithmeticOp::Multiply => Ok(a * b),
            ArithmeticOp::Divide if b == 0.0 => {
                Err(NodeError::ExecutionFailed("division by zero".to_string()))
            }
            ArithmeticOp::Divide => Ok(a / b),
        }
    }

    /// Apply the operation. Vectors combine component-wise with vectors of
    /// the same size (add, subtract) or scale by a number (multiply, divide).
    pub fn apply(&self, a: &Value, b: &Value) -> Result<Value, NodeError> {
        use ArithmeticOp::*;

        match (self, a, b) {
            (_, Value::Number(x), Value::Number(y)) => self.scalar(*x, *y).map(Value::Number),
            (Add | Subtract, Value::Vec2(x), Value::Vec2(y)) => {
                Ok(Value::Vec2([self.scalar(x[0], y[0])?, self.scalar(x[1], y[1])?]))
            }
            (Add | Subtract, Value::Vec3(x), Value::Vec3(y)) => Ok(Value::Vec3([
                self.scalar(x[0], y[0])?,
                self.scalar(x[1], y[1])?,
                self.scalar(x[2], y[2])?,
            ])),
            (Multiply | Divide, Value::Vec2(v), Value::Number(k)) => {
                Ok(Value::Vec2([self.scalar(v[0], *k)?, self.scalar(v[1], *k)?]))
            }
            (Multiply | Divide, Value::Vec3(v), Value::Number(k)) => Ok(Value::Vec3([
                self.scalar(v[0], *k)?,
                self.scalar(v[1], *k)?,
                self.scalar(v[2], *k)?,
            ])),
            (Multiply, Value::Number(_), Value::Vec2(_) | Value::Vec3(_)) => self.apply(b, a),
            _ => Err(NodeError::ExecutionFailed(format!(
                "cannot evaluate {} {} {}",
                a.type_name(),
                self.symbol(),
                b.type_name()
            ))),
        }
    }
}

pub struct ArithmeticNode {
    op: ArithmeticOp,
}

impl ArithmeticNode {
    pub fn new(op: ArithmeticOp) -> Self {
        Self { op }
    }
}

impl Node for ArithmeticNode {
    fn node_type(&self) -> &str {
        self.op.node_type()
    }

    fn execute(&self, ctx: &mut NodeContext<'_>) -> Result<usize, NodeError> {
        let a = ctx.require_input(0, "a")?;
        let b = ctx.require_input(1, "b")?;
        let result = self.op.apply(a, b)?;
        ctx.set_output(0, result)?;
        Ok(0)
    }
}

pub struct ArithmeticNodeFactory(pub ArithmeticOp);

impl NodeFactory for ArithmeticNodeFactory {
    fn create(&self) -> Arc<dyn Node> {
        Arc::new(ArithmeticNode::new(self.0))
    }

    fn node_type(&self) -> &str {
        self.0.node_type()
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::new("math", format!("Computes a {} b", self.0.symbol()))
            .with_input("a", "Left operand")
            .with_input("b", "Right operand")
            .with_output("result", "Result of the operation")
            .with_branch("next", "Next node")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_combine_componentwise() {
        let sum = ArithmeticOp::Add
            .apply(&Value::Vec3([1.0, 2.0, 3.0]), &Value::Vec3([1.0, 1.0, 1.0]))
            .unwrap();
        assert_eq!(sum, Value::Vec3([2.0, 3.0, 4.0]));

        let scaled = ArithmeticOp::Multiply
            .apply(&Value::Number(2.0), &Value::Vec2([1.5, -1.0]))
            .unwrap();
        assert_eq!(scaled, Value::Vec2([3.0, -2.0]));
    }

    #[test]
    fn mismatched_operands_fail() {
        let err = ArithmeticOp::Add
            .apply(&Value::Vec2([1.0, 1.0]), &Value::Number(1.0))
            .unwrap_err();
        assert!(matches!(err, NodeError::ExecutionFailed(_)));
        assert!(ArithmeticOp::Divide
            .apply(&Value::Number(1.0), &Value::Number(0.0))
            .is_err());
    }
}

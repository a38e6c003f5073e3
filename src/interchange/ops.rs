//! Operators understood by the reference JSON interpreter.
//!
//! Scalers follow the usual conventions: a zero standard deviation, range or
//! max-abs is replaced by one so constant features pass through unscaled.

use ndarray::Array1;
use serde_json::{Map as JsonMap, Number, Value as JsonValue};

use super::{ParamMap, PortableModel};
use crate::error::{Result, ScoringError};

const SUPPORTED_OPS: &[&str] = &[
    "standard_scaler",
    "min_max_scaler",
    "max_abs_scaler",
    "vector_assembler",
    "linear_regression",
    "logistic_regression",
];

/// Whether the interpreter knows how to build `op`.
pub fn is_supported(op: &str) -> bool {
    SUPPORTED_OPS.contains(&op)
}

/// Build an executable model for `op` from its parameters.
///
/// # Errors
/// Returns [`ScoringError::Interpretation`] for unknown ops and for missing or
/// ill-typed parameters.
pub fn build(op: &str, params: &ParamMap) -> Result<Box<dyn PortableModel>> {
    let p = Params { op, map: params };
    let model: Box<dyn PortableModel> = match op {
        "standard_scaler" => Box::new(ElementwiseScaler::standard(&p)?),
        "min_max_scaler" => Box::new(ElementwiseScaler::min_max(&p)?),
        "max_abs_scaler" => Box::new(ElementwiseScaler::max_abs(&p)?),
        "vector_assembler" => Box::new(VectorAssembler::new(&p)?),
        "linear_regression" => Box::new(LinearPredictor::new(&p, Link::Identity)?),
        "logistic_regression" => Box::new(LinearPredictor::new(&p, Link::Logistic)?),
        other => {
            return Err(ScoringError::Interpretation(format!(
                "unknown op '{}'",
                other
            )))
        }
    };
    Ok(model)
}

/// Typed access to an op's parameter map.
struct Params<'a> {
    op: &'a str,
    map: &'a ParamMap,
}

impl Params<'_> {
    fn error(&self, key: &str, what: &str) -> ScoringError {
        ScoringError::Interpretation(format!("{}: param '{}' {}", self.op, key, what))
    }

    fn string(&self, key: &str) -> Result<String> {
        match self.map.get(key) {
            Some(JsonValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(self.error(key, "must be a string")),
            None => Err(self.error(key, "is missing")),
        }
    }

    fn strings(&self, key: &str) -> Result<Vec<String>> {
        let items = match self.map.get(key) {
            Some(JsonValue::Array(items)) => items,
            Some(_) => return Err(self.error(key, "must be an array of strings")),
            None => return Err(self.error(key, "is missing")),
        };
        items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.error(key, "must be an array of strings"))
            })
            .collect()
    }

    fn reals(&self, key: &str) -> Result<Array1<f64>> {
        match self.map.get(key) {
            Some(JsonValue::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_f64()
                        .ok_or_else(|| self.error(key, "must be an array of numbers"))
                })
                .collect::<Result<Vec<_>>>()
                .map(Array1::from),
            Some(JsonValue::Number(n)) => n
                .as_f64()
                .map(|x| Array1::from(vec![x]))
                .ok_or_else(|| self.error(key, "must be a number")),
            Some(_) => Err(self.error(key, "must be an array of numbers")),
            None => Err(self.error(key, "is missing")),
        }
    }

    fn real_or(&self, key: &str, default: f64) -> Result<f64> {
        match self.map.get(key) {
            None => Ok(default),
            Some(v) => v.as_f64().ok_or_else(|| self.error(key, "must be a number")),
        }
    }

    fn flag_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.map.get(key) {
            None => Ok(default),
            Some(v) => v.as_bool().ok_or_else(|| self.error(key, "must be a boolean")),
        }
    }
}

/// A numeric cell read from the model input.
enum Numeric {
    Scalar(f64),
    Vector(Array1<f64>),
}

impl Numeric {
    fn len(&self) -> usize {
        match self {
            Numeric::Scalar(_) => 1,
            Numeric::Vector(v) => v.len(),
        }
    }

    fn into_array(self) -> Array1<f64> {
        match self {
            Numeric::Scalar(x) => Array1::from(vec![x]),
            Numeric::Vector(v) => v,
        }
    }
}

/// Read a numeric column; `None` when the column is absent or null.
fn read_numeric(op: &str, input: &JsonValue, col: &str) -> Result<Option<Numeric>> {
    let value = match input.get(col) {
        None | Some(JsonValue::Null) => return Ok(None),
        Some(v) => v,
    };
    let bad = || {
        ScoringError::Interpretation(format!(
            "{}: input '{}' must be a number or an array of numbers",
            op, col
        ))
    };
    match value {
        JsonValue::Number(n) => n.as_f64().map(|x| Some(Numeric::Scalar(x))).ok_or_else(bad),
        JsonValue::Array(items) => items
            .iter()
            .map(|v| v.as_f64().ok_or_else(bad))
            .collect::<Result<Vec<_>>>()
            .map(|xs| Some(Numeric::Vector(Array1::from(xs)))),
        _ => Err(bad()),
    }
}

fn real_to_json(op: &str, x: f64) -> Result<JsonValue> {
    Number::from_f64(x).map(JsonValue::Number).ok_or_else(|| {
        ScoringError::Interpretation(format!("{}: produced non-finite value {}", op, x))
    })
}

fn numeric_to_json(op: &str, value: Numeric) -> Result<JsonValue> {
    match value {
        Numeric::Scalar(x) => real_to_json(op, x),
        Numeric::Vector(v) => v
            .iter()
            .map(|&x| real_to_json(op, x))
            .collect::<Result<Vec<_>>>()
            .map(JsonValue::Array),
    }
}

fn single_output(col: &str, value: JsonValue) -> JsonValue {
    let mut out = JsonMap::with_capacity(1);
    out.insert(col.to_string(), value);
    JsonValue::Object(out)
}

fn nonzero_or_one(values: Array1<f64>) -> Array1<f64> {
    values.mapv(|x| if x == 0.0 { 1.0 } else { x })
}

/// `y = (x - center) / divisor * factor + offset`, element by element.
struct ElementwiseScaler {
    op: &'static str,
    input_col: String,
    output_col: String,
    center: Array1<f64>,
    divisor: Array1<f64>,
    factor: Array1<f64>,
    offset: Array1<f64>,
}

impl ElementwiseScaler {
    fn standard(p: &Params<'_>) -> Result<Self> {
        let mean = p.reals("mean")?;
        let std_dev = p.reals("std")?;
        if mean.len() != std_dev.len() {
            return Err(p.error("std", "must have the same length as 'mean'"));
        }
        let n = mean.len();
        let center = if p.flag_or("withMean", true)? {
            mean
        } else {
            Array1::zeros(n)
        };
        let divisor = if p.flag_or("withStd", true)? {
            nonzero_or_one(std_dev)
        } else {
            Array1::ones(n)
        };
        Ok(Self {
            op: "standard_scaler",
            input_col: p.string("inputCol")?,
            output_col: p.string("outputCol")?,
            center,
            divisor,
            factor: Array1::ones(n),
            offset: Array1::zeros(n),
        })
    }

    fn min_max(p: &Params<'_>) -> Result<Self> {
        let original_min = p.reals("originalMin")?;
        let original_max = p.reals("originalMax")?;
        if original_min.len() != original_max.len() {
            return Err(p.error("originalMax", "must have the same length as 'originalMin'"));
        }
        let min = p.real_or("min", 0.0)?;
        let max = p.real_or("max", 1.0)?;
        let n = original_min.len();
        let range = &original_max - &original_min;
        // Constant features are shifted to the lower bound, not stretched.
        let factor = range.mapv(|r| if r == 0.0 { 1.0 } else { max - min });
        Ok(Self {
            op: "min_max_scaler",
            input_col: p.string("inputCol")?,
            output_col: p.string("outputCol")?,
            center: original_min,
            divisor: nonzero_or_one(range),
            factor,
            offset: Array1::from_elem(n, min),
        })
    }

    fn max_abs(p: &Params<'_>) -> Result<Self> {
        let max_abs = p.reals("maxAbs")?.mapv(f64::abs);
        let n = max_abs.len();
        Ok(Self {
            op: "max_abs_scaler",
            input_col: p.string("inputCol")?,
            output_col: p.string("outputCol")?,
            center: Array1::zeros(n),
            divisor: nonzero_or_one(max_abs),
            factor: Array1::ones(n),
            offset: Array1::zeros(n),
        })
    }

    fn apply(&self, x: &Array1<f64>) -> Array1<f64> {
        (x - &self.center) / &self.divisor * &self.factor + &self.offset
    }
}

impl PortableModel for ElementwiseScaler {
    fn transform(&self, input: &JsonValue) -> Result<JsonValue> {
        let value = match read_numeric(self.op, input, &self.input_col)? {
            None => return Ok(single_output(&self.output_col, JsonValue::Null)),
            Some(v) => v,
        };
        if value.len() != self.center.len() {
            return Err(ScoringError::Interpretation(format!(
                "{}: expected {} features, got {}",
                self.op,
                self.center.len(),
                value.len()
            )));
        }
        let scaled = match value {
            Numeric::Scalar(x) => Numeric::Scalar(self.apply(&Array1::from(vec![x]))[0]),
            Numeric::Vector(v) => Numeric::Vector(self.apply(&v)),
        };
        Ok(single_output(
            &self.output_col,
            numeric_to_json(self.op, scaled)?,
        ))
    }

    fn op(&self) -> &str {
        self.op
    }
}

/// Concatenates numeric columns into one vector.
struct VectorAssembler {
    input_cols: Vec<String>,
    output_col: String,
}

impl VectorAssembler {
    fn new(p: &Params<'_>) -> Result<Self> {
        let input_cols = p.strings("inputCols")?;
        if input_cols.is_empty() {
            return Err(p.error("inputCols", "must not be empty"));
        }
        Ok(Self {
            input_cols,
            output_col: p.string("outputCol")?,
        })
    }
}

impl PortableModel for VectorAssembler {
    fn transform(&self, input: &JsonValue) -> Result<JsonValue> {
        let mut assembled = Vec::new();
        for col in &self.input_cols {
            match read_numeric("vector_assembler", input, col)? {
                Some(value) => assembled.extend(value.into_array()),
                None => {
                    return Err(ScoringError::Interpretation(format!(
                        "vector_assembler: input '{}' is null",
                        col
                    )))
                }
            }
        }
        Ok(single_output(
            &self.output_col,
            numeric_to_json("vector_assembler", Numeric::Vector(Array1::from(assembled)))?,
        ))
    }

    fn op(&self) -> &str {
        "vector_assembler"
    }
}

#[derive(Clone, Copy, Debug)]
enum Link {
    Identity,
    Logistic,
}

/// Linear model; the logistic link yields the positive-class probability.
struct LinearPredictor {
    link: Link,
    input_col: String,
    output_col: String,
    coefficients: Array1<f64>,
    intercept: f64,
}

impl LinearPredictor {
    fn new(p: &Params<'_>, link: Link) -> Result<Self> {
        let coefficients = p.reals("coefficients")?;
        if coefficients.is_empty() {
            return Err(p.error("coefficients", "must not be empty"));
        }
        Ok(Self {
            link,
            input_col: p.string("inputCol")?,
            output_col: p.string("outputCol")?,
            coefficients,
            intercept: p.real_or("intercept", 0.0)?,
        })
    }

    fn op_name(&self) -> &'static str {
        match self.link {
            Link::Identity => "linear_regression",
            Link::Logistic => "logistic_regression",
        }
    }
}

impl PortableModel for LinearPredictor {
    fn transform(&self, input: &JsonValue) -> Result<JsonValue> {
        let op = self.op_name();
        let features = match read_numeric(op, input, &self.input_col)? {
            None => return Ok(single_output(&self.output_col, JsonValue::Null)),
            Some(v) => v.into_array(),
        };
        if features.len() != self.coefficients.len() {
            return Err(ScoringError::Interpretation(format!(
                "{}: expected {} features, got {}",
                op,
                self.coefficients.len(),
                features.len()
            )));
        }
        let margin = features.dot(&self.coefficients) + self.intercept;
        let prediction = match self.link {
            Link::Identity => margin,
            Link::Logistic => 1.0 / (1.0 + (-margin).exp()),
        };
        Ok(single_output(&self.output_col, real_to_json(op, prediction)?))
    }

    fn op(&self) -> &str {
        self.op_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: JsonValue) -> ParamMap {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("params must be an object"),
        }
    }

    fn approx(actual: &JsonValue, expected: f64) {
        let x = actual.as_f64().expect("number");
        assert!((x - expected).abs() < 1e-12, "{} vs {}", x, expected);
    }

    #[test]
    fn test_standard_scaler_scalar_and_vector() {
        let model = build(
            "standard_scaler",
            &params(json!({
                "inputCol": "input", "outputCol": "output",
                "mean": [1.0, 2.0], "std": [2.0, 0.0]
            })),
        )
        .unwrap();
        let out = model.transform(&json!({"input": [3.0, 5.0]})).unwrap();
        approx(&out["output"][0], 1.0);
        // zero std is treated as one
        approx(&out["output"][1], 3.0);

        let err = model.transform(&json!({"input": 3.0})).unwrap_err();
        assert!(matches!(err, ScoringError::Interpretation(_)));
    }

    #[test]
    fn test_standard_scaler_without_mean() {
        let model = build(
            "standard_scaler",
            &params(json!({
                "inputCol": "input", "outputCol": "output",
                "mean": [10.0], "std": [4.0], "withMean": false
            })),
        )
        .unwrap();
        let out = model.transform(&json!({"input": 2.0})).unwrap();
        approx(&out["output"], 0.5);
    }

    #[test]
    fn test_null_input_gives_null_output() {
        let model = build(
            "standard_scaler",
            &params(json!({"inputCol": "input", "outputCol": "output", "mean": [0.0], "std": [1.0]})),
        )
        .unwrap();
        let out = model.transform(&json!({"input": null})).unwrap();
        assert_eq!(out, json!({"output": null}));
        let out = model.transform(&json!({})).unwrap();
        assert_eq!(out, json!({"output": null}));
    }

    #[test]
    fn test_min_max_scaler() {
        let model = build(
            "min_max_scaler",
            &params(json!({
                "inputCol": "input", "outputCol": "output",
                "originalMin": [0.0, 5.0], "originalMax": [10.0, 5.0],
                "min": -1.0, "max": 1.0
            })),
        )
        .unwrap();
        let out = model.transform(&json!({"input": [2.5, 5.0]})).unwrap();
        approx(&out["output"][0], -0.5);
        // constant feature: shifted to the lower bound
        approx(&out["output"][1], -1.0);
    }

    #[test]
    fn test_max_abs_scaler() {
        let model = build(
            "max_abs_scaler",
            &params(json!({"inputCol": "input", "outputCol": "output", "maxAbs": [-4.0, 0.0]})),
        )
        .unwrap();
        let out = model.transform(&json!({"input": [2.0, 3.0]})).unwrap();
        approx(&out["output"][0], 0.5);
        approx(&out["output"][1], 3.0);
    }

    #[test]
    fn test_vector_assembler() {
        let model = build(
            "vector_assembler",
            &params(json!({"inputCols": ["a", "b"], "outputCol": "output"})),
        )
        .unwrap();
        let out = model.transform(&json!({"a": 1.0, "b": [2.0, 3.0]})).unwrap();
        assert_eq!(out, json!({"output": [1.0, 2.0, 3.0]}));

        let err = model.transform(&json!({"a": 1.0})).unwrap_err();
        assert!(err.to_string().contains("'b' is null"));
    }

    #[test]
    fn test_linear_and_logistic_regression() {
        let linear = build(
            "linear_regression",
            &params(json!({
                "inputCol": "input", "outputCol": "output",
                "coefficients": [2.0, -1.0], "intercept": 0.5
            })),
        )
        .unwrap();
        let out = linear.transform(&json!({"input": [3.0, 1.0]})).unwrap();
        approx(&out["output"], 5.5);

        let logistic = build(
            "logistic_regression",
            &params(json!({
                "inputCol": "input", "outputCol": "output",
                "coefficients": [1.0], "intercept": 0.0
            })),
        )
        .unwrap();
        let out = logistic.transform(&json!({"input": 0.0})).unwrap();
        approx(&out["output"], 0.5);
        assert_eq!(logistic.op(), "logistic_regression");
    }

    #[test]
    fn test_rejects_text_input() {
        let model = build(
            "linear_regression",
            &params(json!({"inputCol": "input", "outputCol": "output", "coefficients": [1.0]})),
        )
        .unwrap();
        assert!(model.transform(&json!({"input": "1.0"})).is_err());
    }

    #[test]
    fn test_build_rejects_bad_params() {
        let missing = build(
            "standard_scaler",
            &params(json!({"inputCol": "input", "outputCol": "output", "mean": [0.0]})),
        );
        assert!(matches!(missing, Err(ScoringError::Interpretation(_))));

        let mismatched = build(
            "standard_scaler",
            &params(json!({
                "inputCol": "input", "outputCol": "output",
                "mean": [0.0, 1.0], "std": [1.0]
            })),
        );
        assert!(mismatched.is_err());

        let ill_typed = build(
            "vector_assembler",
            &params(json!({"inputCols": "a", "outputCol": "output"})),
        );
        assert!(ill_typed.is_err());
    }

    #[test]
    fn test_build_rejects_unknown_op() {
        assert!(build("tokenizer", &ParamMap::new()).is_err());
        assert!(!is_supported("tokenizer"));
        assert!(is_supported("max_abs_scaler"));
    }
}

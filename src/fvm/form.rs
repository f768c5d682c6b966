//! Affine expressions over the unknown vector
//!
//! Stencils are written as `LinearForm`s (Σ c_j x_j + k); a balance equation
//! pairs the form evaluated at the new time level with the form evaluated at
//! the previous one.

use nalgebra::DVector;

/// Σ coefs·x + constant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearForm {
    pub coefs: Vec<(usize, f64)>,
    pub constant: f64,
}

impl LinearForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single unknown with a coefficient
    pub fn var(index: usize, coef: f64) -> Self {
        Self {
            coefs: vec![(index, coef)],
            constant: 0.0,
        }
    }

    pub fn from_constant(value: f64) -> Self {
        Self {
            coefs: Vec::new(),
            constant: value,
        }
    }

    pub fn add_var(&mut self, index: usize, coef: f64) -> &mut Self {
        self.coefs.push((index, coef));
        self
    }

    pub fn add_constant(&mut self, value: f64) -> &mut Self {
        self.constant += value;
        self
    }

    /// self += scale · other
    pub fn add(&mut self, other: &LinearForm, scale: f64) -> &mut Self {
        self.coefs
            .extend(other.coefs.iter().map(|&(j, c)| (j, c * scale)));
        self.constant += other.constant * scale;
        self
    }

    pub fn scaled(&self, scale: f64) -> LinearForm {
        let mut out = LinearForm::new();
        out.add(self, scale);
        out
    }

    /// scale · (a − b)
    pub fn difference(a: &LinearForm, b: &LinearForm, scale: f64) -> LinearForm {
        let mut out = a.scaled(scale);
        out.add(b, -scale);
        out
    }

    pub fn eval(&self, x: &DVector<f64>) -> f64 {
        self.coefs.iter().map(|&(j, c)| c * x[j]).sum::<f64>() + self.constant
    }
}

/// One balance equation: lhs·x^{n+1} = history·x^n + source
///
/// The first step adds `start·x^0 + start_source` on top: terms whose value at
/// the previous level is fixed by a boundary condition for every later step
/// are read from the initial fields instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub lhs: Vec<(usize, f64)>,
    pub history: Vec<(usize, f64)>,
    pub source: f64,
    pub start: Vec<(usize, f64)>,
    pub start_source: f64,
}

/// Accumulates the implicit and explicit parts of an equation
#[derive(Debug, Clone, Default)]
pub(crate) struct RowBuilder {
    implicit: LinearForm,
    explicit: LinearForm,
    start: LinearForm,
}

impl RowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Term evaluated at the new time level
    pub fn implicit(&mut self, form: &LinearForm, scale: f64) -> &mut Self {
        self.implicit.add(form, scale);
        self
    }

    /// Matching term evaluated at the previous time level
    pub fn explicit(&mut self, form: &LinearForm, scale: f64) -> &mut Self {
        self.explicit.add(form, scale);
        self
    }

    /// Time-derivative term: form(x^{n+1}) − form(x^n)
    pub fn rate(&mut self, form: &LinearForm, scale: f64) -> &mut Self {
        self.implicit(form, scale).explicit(form, scale)
    }

    /// Correction to the previous-level terms applied on the first step only
    pub fn start(&mut self, form: &LinearForm, scale: f64) -> &mut Self {
        self.start.add(form, scale);
        self
    }

    pub fn finish(self) -> Row {
        Row {
            lhs: self.implicit.coefs,
            history: self.explicit.coefs,
            source: self.explicit.constant - self.implicit.constant,
            start: self.start.coefs,
            start_source: self.start.constant,
        }
    }
}

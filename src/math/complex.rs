/// Complex arithmetic and transcendental functions.
///
/// These are the building blocks the hypercomplex "function" fractals lift
/// into four dimensions. Error checking is lax on purpose: a few functions
/// leave `target` untouched when their input is degenerate (zero divisor,
/// vanishing `tan`/`tanh` denominator, `atanh(±1)`), and rendered output
/// depends on the stale value being carried forward. Keep it that way.

/// A complex number `x + iy`.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct Complex {
    pub x: f64,
    pub y: f64,
}

impl Complex {
    pub const fn new(x: f64, y: f64) -> Self {
        Complex { x, y }
    }
}

/// Signature shared by every function a hypercomplex fractal can iterate.
/// The third argument is the exponent; only `complex_pwr` reads it.
pub type ComplexFn = fn(&mut Complex, &Complex, &Complex);

// ─── Arithmetic ──────────────────────────────────────────────

#[inline(always)]
pub fn complex_mult(a: &Complex, b: &Complex) -> Complex {
    Complex {
        x: a.x * b.x - a.y * b.y,
        y: a.x * b.y + a.y * b.x,
    }
}

/// `target = a / b`. No-op when `b` is zero.
pub fn complex_div(target: &mut Complex, a: &Complex, b: &Complex) {
    let modulus = b.x * b.x + b.y * b.y;
    if modulus == 0.0 {
        return;
    }
    let yxmod = b.x / modulus;
    let yymod = -b.y / modulus;
    let tmpx = a.x * yxmod - a.y * yymod;
    target.y = a.x * yymod + a.y * yxmod;
    target.x = tmpx;
}

/// Principal square root via the half angle. `sqrt(0) = 0`.
pub fn complex_sqrt(target: &mut Complex, source: &Complex) {
    if source.x == 0.0 && source.y == 0.0 {
        target.x = 0.0;
        target.y = 0.0;
        return;
    }
    let mag = (source.x * source.x + source.y * source.y).sqrt().sqrt();
    let theta = source.y.atan2(source.x) / 2.0;
    target.y = mag * theta.sin();
    target.x = mag * theta.cos();
}

// ─── Exponential family ──────────────────────────────────────

pub fn complex_exp(target: &mut Complex, source: &Complex, _: &Complex) {
    let expx = source.x.exp();
    target.x = expx * source.y.cos();
    target.y = expx * source.y.sin();
}

pub fn complex_ln(target: &mut Complex, source: &Complex, _: &Complex) {
    let modulus = (source.x * source.x + source.y * source.y).sqrt();
    let zx = modulus.ln();
    let zy = source.y.atan2(source.x);
    target.x = zx;
    target.y = zy;
}

/// `z1^z2 = exp(z2 * ln z1)`, with `0^z = 0` and a flush to zero when the
/// real part of the exponent falls below -690.
pub fn complex_pwr(target: &mut Complex, source: &Complex, exponent: &Complex) {
    if source.x == 0.0 && source.y == 0.0 {
        target.x = 0.0;
        target.y = 0.0;
        return;
    }

    let mut c_log = Complex::default();
    complex_ln(&mut c_log, source, exponent);
    let t = complex_mult(&c_log, exponent);

    let e2x = if t.x < -690.0 { 0.0 } else { t.x.exp() };
    target.x = e2x * t.y.cos();
    target.y = e2x * t.y.sin();
}

// ─── Trigonometric family ────────────────────────────────────

pub fn complex_sin(target: &mut Complex, source: &Complex, _: &Complex) {
    target.x = source.x.sin() * source.y.cosh();
    target.y = source.x.cos() * source.y.sinh();
}

pub fn complex_cos(target: &mut Complex, source: &Complex, _: &Complex) {
    target.x = source.x.cos() * source.y.cosh();
    target.y = -source.x.sin() * source.y.sinh();
}

/// No-op when `cos 2x + cosh 2y` vanishes.
pub fn complex_tan(target: &mut Complex, source: &Complex, _: &Complex) {
    let x = 2.0 * source.x;
    let y = 2.0 * source.y;
    let denom = x.cos() + y.cosh();
    if denom == 0.0 {
        return;
    }
    target.x = x.sin() / denom;
    target.y = y.sinh() / denom;
}

/// `asin z = -i ln(iz + sqrt(1 - z²))`
pub fn complex_asin(target: &mut Complex, source: &Complex, exponent: &Complex) {
    let mut tempz1 = complex_mult(source, source);
    tempz1.x = 1.0 - tempz1.x;
    tempz1.y = -tempz1.y;
    let radicand = tempz1;
    complex_sqrt(&mut tempz1, &radicand);

    // i * z
    tempz1.x += -source.y;
    tempz1.y += source.x;

    let arg = tempz1;
    complex_ln(&mut tempz1, &arg, exponent);
    target.x = tempz1.y;
    target.y = -tempz1.x;
}

/// `acos z = -i ln(z + sqrt(z² - 1))`
pub fn complex_acos(target: &mut Complex, source: &Complex, exponent: &Complex) {
    let mut temp = complex_mult(source, source);
    temp.x -= 1.0;
    let radicand = temp;
    complex_sqrt(&mut temp, &radicand);

    temp.x += source.x;
    temp.y += source.y;

    let arg = temp;
    complex_ln(&mut temp, &arg, exponent);
    target.x = temp.y;
    target.y = -temp.x;
}

/// `atan z = i/2 ln((1 - iz) / (1 + iz))`, with the real and imaginary
/// axes handled separately.
pub fn complex_atan(target: &mut Complex, source: &Complex, exponent: &Complex) {
    if source.x == 0.0 && source.y == 0.0 {
        target.x = 0.0;
        target.y = 0.0;
    } else if source.x != 0.0 && source.y == 0.0 {
        target.x = source.x.atan();
        target.y = 0.0;
    } else if source.x == 0.0 && source.y != 0.0 {
        let mut temp0 = Complex::new(source.y, 0.0);
        let arg = temp0;
        complex_atanh(&mut temp0, &arg, exponent);
        target.x = -temp0.y;
        target.y = temp0.x;
    } else if source.x != 0.0 && source.y != 0.0 {
        let iz = Complex::new(-source.y, source.x);
        let temp1 = Complex::new(1.0 - iz.x, -iz.y);
        let temp2 = Complex::new(1.0 + iz.x, iz.y);

        let mut temp3 = Complex::default();
        complex_div(&mut temp3, &temp1, &temp2);
        let arg = temp3;
        complex_ln(&mut temp3, &arg, exponent);
        target.x = -temp3.y * 0.5;
        target.y = 0.5 * temp3.x;
    }
    // NaN inputs fall through every branch and leave target untouched.
}

// ─── Hyperbolic family ───────────────────────────────────────

pub fn complex_sinh(target: &mut Complex, source: &Complex, _: &Complex) {
    target.x = source.x.sinh() * source.y.cos();
    target.y = source.x.cosh() * source.y.sin();
}

pub fn complex_cosh(target: &mut Complex, source: &Complex, _: &Complex) {
    target.x = source.x.cosh() * source.y.cos();
    target.y = source.x.sinh() * source.y.sin();
}

/// No-op when `cosh 2x + cos 2y` vanishes.
pub fn complex_tanh(target: &mut Complex, source: &Complex, _: &Complex) {
    let x = 2.0 * source.x;
    let y = 2.0 * source.y;
    let denom = x.cosh() + y.cos();
    if denom == 0.0 {
        return;
    }
    target.x = x.sinh() / denom;
    target.y = y.sin() / denom;
}

/// `asinh z = ln(z + sqrt(z² + 1))`
pub fn complex_asinh(target: &mut Complex, source: &Complex, exponent: &Complex) {
    let mut temp = complex_mult(source, source);
    temp.x += 1.0;
    let radicand = temp;
    complex_sqrt(&mut temp, &radicand);
    temp.x += source.x;
    temp.y += source.y;
    complex_ln(target, &temp, exponent);
}

/// `acosh z = ln(z + sqrt(z² - 1))`
pub fn complex_acosh(target: &mut Complex, source: &Complex, exponent: &Complex) {
    let mut tempz = complex_mult(source, source);
    tempz.x -= 1.0;
    let radicand = tempz;
    complex_sqrt(&mut tempz, &radicand);
    tempz.x += source.x;
    tempz.y += source.y;
    complex_ln(target, &tempz, exponent);
}

/// `atanh z = 1/2 ln((1 + z) / (1 - z))`. No-op at `z = ±1`.
pub fn complex_atanh(target: &mut Complex, source: &Complex, exponent: &Complex) {
    if source.x == 0.0 {
        target.x = 0.0;
        target.y = source.y.atan();
    } else if source.x.abs() == 1.0 && source.y == 0.0 {
        // singular, leave target as is
    } else if source.x.abs() < 1.0 && source.y == 0.0 {
        target.x = ((1.0 + source.x) / (1.0 - source.x)).ln() / 2.0;
        target.y = 0.0;
    } else {
        let temp0 = Complex::new(1.0 + source.x, source.y);
        let temp1 = Complex::new(1.0 - source.x, -source.y);
        let mut temp2 = Complex::default();
        complex_div(&mut temp2, &temp0, &temp1);
        let arg = temp2;
        complex_ln(&mut temp2, &arg, exponent);
        target.x = 0.5 * temp2.x;
        target.y = 0.5 * temp2.y;
    }
}

// ─── Dispatch ────────────────────────────────────────────────

/// The transcendental maps a hypercomplex function fractal can iterate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComplexFunction {
    Exp,
    Ln,
    Sin,
    ASin,
    Cos,
    ACos,
    Tan,
    ATan,
    Sinh,
    ASinh,
    Cosh,
    ACosh,
    Tanh,
    ATanh,
    Pwr,
}

impl ComplexFunction {
    pub fn method(self) -> ComplexFn {
        match self {
            ComplexFunction::Exp => complex_exp,
            ComplexFunction::Ln => complex_ln,
            ComplexFunction::Sin => complex_sin,
            ComplexFunction::ASin => complex_asin,
            ComplexFunction::Cos => complex_cos,
            ComplexFunction::ACos => complex_acos,
            ComplexFunction::Tan => complex_tan,
            ComplexFunction::ATan => complex_atan,
            ComplexFunction::Sinh => complex_sinh,
            ComplexFunction::ASinh => complex_asinh,
            ComplexFunction::Cosh => complex_cosh,
            ComplexFunction::ACosh => complex_acosh,
            ComplexFunction::Tanh => complex_tanh,
            ComplexFunction::ATanh => complex_atanh,
            ComplexFunction::Pwr => complex_pwr,
        }
    }

    #[inline]
    pub fn apply(self, target: &mut Complex, source: &Complex, exponent: &Complex) {
        (self.method())(target, source, exponent)
    }
}

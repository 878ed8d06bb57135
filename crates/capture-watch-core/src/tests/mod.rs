mod intercept;
mod support;

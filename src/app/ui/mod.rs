mod filter;
mod panels;
mod results;

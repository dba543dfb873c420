mod challenge;
mod stats;
mod turn;

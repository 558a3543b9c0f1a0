pub mod decision_engine;

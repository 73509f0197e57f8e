mod domain_aggregation;
mod domain_quota;

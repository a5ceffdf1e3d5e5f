// Test Module Organization

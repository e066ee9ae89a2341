mod fraction;

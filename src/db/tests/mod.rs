mod covers;
